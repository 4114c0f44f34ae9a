//! Portal client for the external tender source
//!
//! The portal exposes scraped tender documents by id. This crate holds the
//! document DTOs (the portal speaks PascalCase JSON), the fixed date formats,
//! and the `TenderSource` trait with its HTTP implementation.

pub mod client;
pub mod dates;
pub mod model;

pub use client::{HttpTenderSource, SourceError, TenderSource};
pub use model::ParsedTender;

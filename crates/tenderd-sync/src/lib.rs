//! Tender ingestion and reconciliation
//!
//! Two entry points share the portal field-mapping rules: `ingest` builds a
//! brand-new tender from a fetched document, and `reconcile` runs the
//! periodic fill-in pass over every persisted tender.

pub mod ingest;
pub mod reconcile;

pub use ingest::map_new_tender;
pub use reconcile::{apply_refresh, needs_refresh, ReconcileService, ReconcileSummary};

//! Postgres repositories for tenderd
//!
//! Repositories own all SQL. Listing endpoints compose the dynamic filter
//! builder from `filter` on top of their base predicate; aggregate writes
//! (tender + children, user + roles) run inside one transaction.

pub mod filter;
pub mod repos;

pub use filter::{ListParams, SortDirection};
pub use repos::file::FileRepository;
pub use repos::participant::ParticipantRepository;
pub use repos::tender::TenderRepository;
pub use repos::user::UserRepository;

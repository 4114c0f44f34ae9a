//! Blob storage for tender attachments
//!
//! Defines the `Storage` trait the services consume and the local filesystem
//! backend. Blobs are keyed by `(tender_id, stored_name)`; the stored name is
//! generated on upload and recorded in the file metadata row.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{SavedBlob, Storage, StorageError, StorageResult};

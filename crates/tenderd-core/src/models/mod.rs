pub mod file;
pub mod participant;
pub mod patch;
pub mod tender;
pub mod user;

pub use file::StoredFile;
pub use participant::{CompanyType, Participant};
pub use patch::{ProgressEntryInput, TenderPatch, UserPatch};
pub use tender::{Item, ProgressEntry, ProgressStatus, Tender, TenderStage};
pub use user::{Role, User, UserStatus};

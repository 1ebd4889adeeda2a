pub mod user_deletion;

pub use user_deletion::{DeletionReport, UserDeletionError, UserDeletionService};

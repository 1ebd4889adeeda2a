pub mod user;

pub use user::{Permissions, UserProfile};

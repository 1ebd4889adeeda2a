pub mod delete;

pub use delete::delete as user_delete;
pub use delete::delete_profile as user_profile_delete;
pub use delete::missing_id as user_missing_id;

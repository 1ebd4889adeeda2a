pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod google;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod testing;

pub use app::app;

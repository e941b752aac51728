pub mod auth;
pub mod session;
pub mod token_manager;

pub use session::{Credentials, Session};
pub use token_manager::TokenManager;

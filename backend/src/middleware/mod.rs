//! Request middleware for the Stock Ledger backend

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};

//! Business logic services for the Stock Ledger backend

pub mod auth;
pub mod ledger;
pub mod product;

pub use auth::AuthService;
pub use ledger::LedgerService;
pub use product::ProductService;

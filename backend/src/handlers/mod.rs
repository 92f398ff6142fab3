//! HTTP handlers for the Stock Ledger backend

pub mod auth;
pub mod health;
pub mod movement;
pub mod product;

pub use auth::{login, profile, register};
pub use health::health_check;
pub use movement::{
    get_movement, list_movements, reassign_movement_product, record_inbound, record_outbound,
    update_movement_quantity, void_movement,
};
pub use product::{
    create_product, delete_product, get_product, get_product_by_code, list_products,
    update_product,
};

//! Persistent entities for the Stock Ledger backend
//!
//! Two domain entities — `Product` and `Movement` — plus the user account
//! rows behind authentication. The derived invariant is that a product's
//! `stock` always equals the signed sum of the quantities of its active
//! movements.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inbound,
    Outbound,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
        }
    }
}

/// A tracked product with its running stock count
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    /// Numeric business code, unique per product
    pub code: i64,
    pub description: String,
    /// Current on-hand quantity; never negative
    pub stock: i64,
    /// Optional quantity-type tag ("kg", "unit", ...)
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ledger entry recording an inbound or outbound change to a product's stock
///
/// `quantity` is signed: positive for inbound, negative for outbound. A voided
/// movement (`is_active = false`) keeps its quantity and product reference as
/// a historical record but no longer contributes to stock.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub invoice_number: Option<i64>,
    /// Calendar date only, serialized as YYYY-MM-DD
    pub movement_date: NaiveDate,
    pub description: String,
    pub quantity: i64,
    pub kind: MovementKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    /// Unsigned magnitude of the movement's quantity
    pub fn magnitude(&self) -> i64 {
        self.quantity.abs()
    }
}

/// A movement together with its denormalized product
#[derive(Debug, Clone, Serialize)]
pub struct MovementWithProduct {
    #[serde(flatten)]
    pub movement: Movement,
    pub product: Product,
}

/// User account row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

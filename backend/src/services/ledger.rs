//! Ledger service enforcing stock/movement consistency
//!
//! Every mutating operation runs inside one database transaction and keeps a
//! product's `stock` equal to the signed sum of its active movements. The
//! product row is locked (`FOR UPDATE`) before any arithmetic so concurrent
//! writers against the same product serialize at the row level.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Movement, MovementKind, MovementWithProduct, Product};

/// Ledger service for recording, voiding, and editing stock movements
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Input for recording an inbound movement (merchandise entry)
#[derive(Debug, Deserialize)]
pub struct RecordInboundInput {
    pub product_id: Uuid,
    pub invoice_number: i64,
    /// Calendar date as YYYY-MM-DD, parsed before any transaction opens
    pub date: String,
    pub description: String,
    pub quantity: i64,
}

/// Input for recording an outbound movement (merchandise exit)
#[derive(Debug, Deserialize)]
pub struct RecordOutboundInput {
    pub product_id: Uuid,
    pub date: String,
    pub description: String,
    pub quantity: i64,
}

/// Input for editing a movement's quantity in place
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: i64,
}

/// Input for reassigning a movement to another product
#[derive(Debug, Deserialize)]
pub struct ReassignProductInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Optional filters for listing movements
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub product_id: Option<Uuid>,
    /// Inclusive lower bound on movement date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on movement date
    pub to: Option<NaiveDate>,
}

/// Flat row for movement + product joins
#[derive(Debug, sqlx::FromRow)]
struct MovementProductRow {
    id: Uuid,
    product_id: Uuid,
    invoice_number: Option<i64>,
    movement_date: NaiveDate,
    description: String,
    quantity: i64,
    kind: MovementKind,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    product_code: i64,
    product_description: String,
    product_stock: i64,
    product_unit: Option<String>,
    product_created_at: chrono::DateTime<chrono::Utc>,
    product_updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<MovementProductRow> for MovementWithProduct {
    fn from(row: MovementProductRow) -> Self {
        MovementWithProduct {
            movement: Movement {
                id: row.id,
                product_id: row.product_id,
                invoice_number: row.invoice_number,
                movement_date: row.movement_date,
                description: row.description,
                quantity: row.quantity,
                kind: row.kind,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            product: Product {
                id: row.product_id,
                code: row.product_code,
                description: row.product_description,
                stock: row.product_stock,
                unit: row.product_unit,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, product_id, invoice_number, movement_date, description, \
                                quantity, kind, is_active, created_at, updated_at";

const MOVEMENT_PRODUCT_COLUMNS: &str = "m.id, m.product_id, m.invoice_number, m.movement_date, \
     m.description, m.quantity, m.kind, m.is_active, m.created_at, m.updated_at, \
     p.code AS product_code, p.description AS product_description, p.stock AS product_stock, \
     p.unit AS product_unit, p.created_at AS product_created_at, p.updated_at AS product_updated_at";

/// Stock after recording a new movement of `magnitude` in the given direction
pub(crate) fn stock_after_record(
    kind: MovementKind,
    stock: i64,
    magnitude: i64,
) -> AppResult<i64> {
    match kind {
        MovementKind::Inbound => Ok(stock + magnitude),
        MovementKind::Outbound => {
            if stock < magnitude {
                Err(AppError::InsufficientStock(format!(
                    "Requested {} but only {} on hand",
                    magnitude, stock
                )))
            } else {
                Ok(stock - magnitude)
            }
        }
    }
}

/// Stock after reversing a movement's effect (voiding or reassignment)
///
/// Reversing an inbound withdraws inventory that may already have been
/// consumed by later movements, so it must not underflow.
pub(crate) fn stock_after_reversal(
    kind: MovementKind,
    stock: i64,
    magnitude: i64,
) -> AppResult<i64> {
    match kind {
        MovementKind::Inbound => {
            if stock < magnitude {
                Err(AppError::InsufficientStock(format!(
                    "Cannot reverse inbound of {}: only {} on hand",
                    magnitude, stock
                )))
            } else {
                Ok(stock - magnitude)
            }
        }
        MovementKind::Outbound => Ok(stock + magnitude),
    }
}

/// Stock after editing a movement's magnitude in place
///
/// The edit is a differential adjustment: only the incremental change is
/// validated against current stock, so reducing an inbound movement stays
/// legal even when part of that inflow has since been consumed, as long as
/// the reduction itself does not drive stock negative.
pub(crate) fn stock_after_edit(
    kind: MovementKind,
    stock: i64,
    old_magnitude: i64,
    new_magnitude: i64,
) -> AppResult<i64> {
    let delta = new_magnitude - old_magnitude;
    match kind {
        MovementKind::Inbound => {
            if delta < 0 && stock < -delta {
                Err(AppError::InsufficientStock(format!(
                    "Reducing inbound by {} but only {} on hand",
                    -delta, stock
                )))
            } else {
                Ok(stock + delta)
            }
        }
        MovementKind::Outbound => {
            if delta > 0 && stock < delta {
                Err(AppError::InsufficientStock(format!(
                    "Increasing outbound by {} but only {} on hand",
                    delta, stock
                )))
            } else {
                Ok(stock - delta)
            }
        }
    }
}

/// Signed quantity stored for a movement of the given kind
pub(crate) fn signed_quantity(kind: MovementKind, magnitude: i64) -> i64 {
    match kind {
        MovementKind::Inbound => magnitude,
        MovementKind::Outbound => -magnitude,
    }
}

/// Parse a calendar-only date in YYYY-MM-DD format
pub(crate) fn parse_movement_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| AppError::Validation {
        field: "date".to_string(),
        message: "Date must be in YYYY-MM-DD format".to_string(),
    })
}

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_description(description: &str) -> AppResult<()> {
    if description.trim().is_empty() {
        return Err(AppError::Validation {
            field: "description".to_string(),
            message: "Description is required".to_string(),
        });
    }
    Ok(())
}

fn ensure_active(movement: &Movement) -> AppResult<()> {
    if !movement.is_active {
        return Err(AppError::AlreadyVoided(format!(
            "Movement {} is voided and can no longer change",
            movement.id
        )));
    }
    Ok(())
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an inbound movement and add its quantity to the product's stock
    pub async fn record_inbound(&self, input: RecordInboundInput) -> AppResult<MovementWithProduct> {
        let date = parse_movement_date(&input.date)?;
        validate_quantity(input.quantity)?;
        validate_description(&input.description)?;

        let mut tx = self.db.begin().await?;

        let product = Self::lock_product(&mut tx, input.product_id).await?;
        let new_stock = stock_after_record(MovementKind::Inbound, product.stock, input.quantity)?;
        let product = Self::update_stock(&mut tx, product.id, new_stock).await?;

        let movement = Self::insert_movement(
            &mut tx,
            product.id,
            Some(input.invoice_number),
            date,
            &input.description,
            MovementKind::Inbound,
            input.quantity,
        )
        .await?;

        tx.commit().await?;

        tracing::debug!(movement_id = %movement.id, product_id = %product.id, "recorded inbound movement");

        Ok(MovementWithProduct { movement, product })
    }

    /// Record an outbound movement and subtract its quantity from the product's stock
    pub async fn record_outbound(
        &self,
        input: RecordOutboundInput,
    ) -> AppResult<MovementWithProduct> {
        let date = parse_movement_date(&input.date)?;
        validate_quantity(input.quantity)?;
        validate_description(&input.description)?;

        let mut tx = self.db.begin().await?;

        let product = Self::lock_product(&mut tx, input.product_id).await?;
        let new_stock = stock_after_record(MovementKind::Outbound, product.stock, input.quantity)?;
        let product = Self::update_stock(&mut tx, product.id, new_stock).await?;

        let movement = Self::insert_movement(
            &mut tx,
            product.id,
            None,
            date,
            &input.description,
            MovementKind::Outbound,
            input.quantity,
        )
        .await?;

        tx.commit().await?;

        tracing::debug!(movement_id = %movement.id, product_id = %product.id, "recorded outbound movement");

        Ok(MovementWithProduct { movement, product })
    }

    /// Void a movement, reversing its effect on the product's stock
    ///
    /// The quantity and product reference stay untouched as a historical
    /// record; only the active flag flips. Voiding is terminal.
    pub async fn void_movement(&self, movement_id: Uuid) -> AppResult<MovementWithProduct> {
        let mut tx = self.db.begin().await?;

        let movement = Self::lock_movement(&mut tx, movement_id).await?;
        ensure_active(&movement)?;

        let product = Self::lock_product(&mut tx, movement.product_id).await?;
        let new_stock = stock_after_reversal(movement.kind, product.stock, movement.magnitude())?;
        let product = Self::update_stock(&mut tx, product.id, new_stock).await?;

        let movement = sqlx::query_as::<_, Movement>(&format!(
            "UPDATE movements SET is_active = FALSE, updated_at = NOW() WHERE id = $1 \
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(movement_id = %movement.id, "voided movement");

        Ok(MovementWithProduct { movement, product })
    }

    /// Edit an active movement's quantity, applying the stock delta
    pub async fn update_quantity(
        &self,
        movement_id: Uuid,
        input: UpdateQuantityInput,
    ) -> AppResult<MovementWithProduct> {
        validate_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;

        let movement = Self::lock_movement(&mut tx, movement_id).await?;
        ensure_active(&movement)?;

        let product = Self::lock_product(&mut tx, movement.product_id).await?;
        let new_stock =
            stock_after_edit(movement.kind, product.stock, movement.magnitude(), input.quantity)?;
        let product = Self::update_stock(&mut tx, product.id, new_stock).await?;

        let movement = sqlx::query_as::<_, Movement>(&format!(
            "UPDATE movements SET quantity = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(signed_quantity(movement.kind, input.quantity))
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MovementWithProduct { movement, product })
    }

    /// Reassign an active movement to another product
    ///
    /// Two phases inside one transaction: reverse the movement's current
    /// effect on its current product, then apply the new quantity to the new
    /// product. The movement's direction is preserved.
    pub async fn reassign_product(
        &self,
        movement_id: Uuid,
        input: ReassignProductInput,
    ) -> AppResult<MovementWithProduct> {
        validate_quantity(input.quantity)?;

        let mut tx = self.db.begin().await?;

        let movement = Self::lock_movement(&mut tx, movement_id).await?;
        ensure_active(&movement)?;

        let product = if input.product_id == movement.product_id {
            // Same product: reverse and reapply against one locked row
            let current = Self::lock_product(&mut tx, movement.product_id).await?;
            let reversed =
                stock_after_reversal(movement.kind, current.stock, movement.magnitude())?;
            let applied = stock_after_record(movement.kind, reversed, input.quantity)?;
            Self::update_stock(&mut tx, current.id, applied).await?
        } else {
            let current = Self::lock_product(&mut tx, movement.product_id).await?;
            let reversed =
                stock_after_reversal(movement.kind, current.stock, movement.magnitude())?;
            Self::update_stock(&mut tx, current.id, reversed).await?;

            let target = Self::lock_product(&mut tx, input.product_id).await?;
            let applied = stock_after_record(movement.kind, target.stock, input.quantity)?;
            Self::update_stock(&mut tx, target.id, applied).await?
        };

        let movement = sqlx::query_as::<_, Movement>(&format!(
            "UPDATE movements SET product_id = $1, quantity = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(product.id)
        .bind(signed_quantity(movement.kind, input.quantity))
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(movement_id = %movement.id, product_id = %product.id, "reassigned movement");

        Ok(MovementWithProduct { movement, product })
    }

    /// List movements with optional filters, newest first
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> AppResult<Vec<MovementWithProduct>> {
        let rows = sqlx::query_as::<_, MovementProductRow>(&format!(
            "SELECT {MOVEMENT_PRODUCT_COLUMNS} \
             FROM movements m \
             JOIN products p ON p.id = m.product_id \
             WHERE ($1::movement_kind IS NULL OR m.kind = $1) \
               AND ($2::uuid IS NULL OR m.product_id = $2) \
               AND ($3::date IS NULL OR m.movement_date >= $3) \
               AND ($4::date IS NULL OR m.movement_date <= $4) \
             ORDER BY m.movement_date DESC, m.created_at DESC"
        ))
        .bind(filter.kind)
        .bind(filter.product_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MovementWithProduct::from).collect())
    }

    /// Fetch one movement together with its product
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<MovementWithProduct> {
        let row = sqlx::query_as::<_, MovementProductRow>(&format!(
            "SELECT {MOVEMENT_PRODUCT_COLUMNS} \
             FROM movements m \
             JOIN products p ON p.id = m.product_id \
             WHERE m.id = $1"
        ))
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        Ok(row.into())
    }

    /// Lock and load a product row for update
    async fn lock_product(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
    ) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT id, code, description, stock, unit, created_at, updated_at \
             FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Lock and load a movement row for update
    async fn lock_movement(
        tx: &mut Transaction<'_, Postgres>,
        movement_id: Uuid,
    ) -> AppResult<Movement> {
        sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1 FOR UPDATE"
        ))
        .bind(movement_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))
    }

    /// Persist a new stock value for a product
    async fn update_stock(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        stock: i64,
    ) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET stock = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING id, code, description, stock, unit, created_at, updated_at",
        )
        .bind(stock)
        .bind(product_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(product)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_movement(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        invoice_number: Option<i64>,
        date: NaiveDate,
        description: &str,
        kind: MovementKind,
        magnitude: i64,
    ) -> AppResult<Movement> {
        let movement = sqlx::query_as::<_, Movement>(&format!(
            "INSERT INTO movements (product_id, invoice_number, movement_date, description, quantity, kind) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(product_id)
        .bind(invoice_number)
        .bind(date)
        .bind(description)
        .bind(signed_quantity(kind, magnitude))
        .bind(kind)
        .fetch_one(&mut **tx)
        .await?;

        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_record_adds_stock() {
        assert_eq!(stock_after_record(MovementKind::Inbound, 0, 50).unwrap(), 50);
        assert_eq!(stock_after_record(MovementKind::Inbound, 30, 20).unwrap(), 50);
    }

    #[test]
    fn outbound_record_subtracts_and_guards_stock() {
        assert_eq!(stock_after_record(MovementKind::Outbound, 50, 20).unwrap(), 30);
        assert_eq!(stock_after_record(MovementKind::Outbound, 20, 20).unwrap(), 0);

        // stock=10, outbound 15 is rejected and stock stays untouched
        let err = stock_after_record(MovementKind::Outbound, 10, 15).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));
    }

    #[test]
    fn void_inbound_rejected_when_partially_consumed() {
        // stock 0 -> inbound 50 -> outbound 20 leaves 30; voiding the inbound
        // would withdraw 50 from a stock of 30
        let stock = stock_after_record(MovementKind::Inbound, 0, 50).unwrap();
        let stock = stock_after_record(MovementKind::Outbound, stock, 20).unwrap();
        assert_eq!(stock, 30);

        let err = stock_after_reversal(MovementKind::Inbound, stock, 50).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));
    }

    #[test]
    fn void_outbound_always_restores_stock() {
        assert_eq!(stock_after_reversal(MovementKind::Outbound, 0, 20).unwrap(), 20);
        assert_eq!(stock_after_reversal(MovementKind::Outbound, 30, 5).unwrap(), 35);
    }

    #[test]
    fn inbound_void_round_trip_restores_stock() {
        let before = 17;
        let after = stock_after_record(MovementKind::Inbound, before, 10).unwrap();
        let restored = stock_after_reversal(MovementKind::Inbound, after, 10).unwrap();
        assert_eq!(restored, before);
    }

    #[test]
    fn edit_inbound_applies_delta() {
        // Inbound of 20, stock includes it; editing to 5 removes 15
        assert_eq!(stock_after_edit(MovementKind::Inbound, 20, 20, 5).unwrap(), 5);

        // Same edit fails when 15 of headroom is no longer there
        let err = stock_after_edit(MovementKind::Inbound, 10, 20, 5).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        // Growing an inbound never needs headroom
        assert_eq!(stock_after_edit(MovementKind::Inbound, 3, 20, 25).unwrap(), 8);
    }

    #[test]
    fn edit_outbound_applies_delta() {
        // Shrinking an outbound returns stock
        assert_eq!(stock_after_edit(MovementKind::Outbound, 10, 20, 5).unwrap(), 25);

        // Growing an outbound needs stock for the increment only
        assert_eq!(stock_after_edit(MovementKind::Outbound, 10, 5, 15).unwrap(), 0);
        let err = stock_after_edit(MovementKind::Outbound, 9, 5, 15).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));
    }

    #[test]
    fn edit_to_same_magnitude_is_noop() {
        assert_eq!(stock_after_edit(MovementKind::Inbound, 7, 12, 12).unwrap(), 7);
        assert_eq!(stock_after_edit(MovementKind::Outbound, 7, 12, 12).unwrap(), 7);
    }

    #[test]
    fn reassign_outbound_between_products() {
        // Outbound of 8 on p1; reversal returns 8 to p1, reapply takes 8 from p2
        let p1 = stock_after_reversal(MovementKind::Outbound, 2, 8).unwrap();
        assert_eq!(p1, 10);

        let p2 = stock_after_record(MovementKind::Outbound, 8, 8).unwrap();
        assert_eq!(p2, 0);

        let err = stock_after_record(MovementKind::Outbound, 7, 8).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));
    }

    #[test]
    fn signed_quantity_matches_kind() {
        assert_eq!(signed_quantity(MovementKind::Inbound, 10), 10);
        assert_eq!(signed_quantity(MovementKind::Outbound, 10), -10);
    }

    #[test]
    fn movement_dates_parse_as_calendar_days() {
        assert_eq!(
            parse_movement_date("2024-01-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
        assert!(parse_movement_date("10/01/2024").is_err());
        assert!(parse_movement_date("2024-13-01").is_err());
        assert!(parse_movement_date("2024-02-30").is_err());
        assert!(parse_movement_date("").is_err());
        assert!(parse_movement_date("2024-01-10T00:00:00Z").is_err());
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(matches!(
            validate_quantity(0).unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            validate_quantity(-5).unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(validate_quantity(1).is_ok());
    }
}

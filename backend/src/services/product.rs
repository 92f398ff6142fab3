//! Product catalog service
//!
//! Products are created with an initial stock; after that the stock field is
//! mutated only through movement processing in the ledger service.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Product;

/// Product service for catalog management
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub code: i64,
    pub description: String,
    pub stock: i64,
    pub unit: Option<String>,
}

/// Input for updating a product's non-stock fields
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub code: Option<i64>,
    pub description: Option<String>,
    pub unit: Option<String>,
}

const PRODUCT_COLUMNS: &str = "id, code, description, stock, unit, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product with its initial stock
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        if input.description.trim().is_empty() {
            return Err(AppError::Validation {
                field: "description".to_string(),
                message: "Description is required".to_string(),
            });
        }
        if input.stock < 0 {
            return Err(AppError::Validation {
                field: "stock".to_string(),
                message: "Initial stock cannot be negative".to_string(),
            });
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE code = $1)",
        )
        .bind(input.code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("product code".to_string()));
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (code, description, stock, unit) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.code)
        .bind(&input.description)
        .bind(input.stock)
        .bind(&input.unit)
        .fetch_one(&self.db)
        .await?;

        tracing::debug!(product_id = %product.id, code = product.code, "created product");

        Ok(product)
    }

    /// List all products ordered by code
    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY code"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Fetch a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Fetch a product by its numeric business code
    pub async fn get_by_code(&self, code: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Update a product's non-stock fields
    ///
    /// Stock is deliberately not updatable here: it only changes through
    /// movement processing.
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        let code = input.code.unwrap_or(existing.code);
        let description = input.description.unwrap_or(existing.description);
        let unit = input.unit.or(existing.unit);

        if description.trim().is_empty() {
            return Err(AppError::Validation {
                field: "description".to_string(),
                message: "Description is required".to_string(),
            });
        }

        if code != existing.code {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE code = $1 AND id != $2)",
            )
            .bind(code)
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;

            if taken {
                return Err(AppError::DuplicateEntry("product code".to_string()));
            }
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET code = $1, description = $2, unit = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(code)
        .bind(&description)
        .bind(&unit)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product with no movements referencing it
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM movements WHERE product_id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict(
                "Product has movements and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }
}

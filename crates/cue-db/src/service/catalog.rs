//! # Catalog Operations
//!
//! Resource and product administration, plus the dashboard query.
//!
//! Catalog rows are shared, long-lived, and referenced by history:
//! retirement (`is_active = false`) is the normal exit, hard deletion
//! is rejected while any session or cart line still points at the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::generate_id;
use crate::service::ServiceResult;
use cue_core::{
    pricing, validation, CoreError, PrepaidStatus, Product, Resource, ResourceCategory, Session,
};

// =============================================================================
// Inputs
// =============================================================================

/// Input for creating a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub name: String,
    pub category: ResourceCategory,
    pub rate_cents_per_hour: i64,
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    /// None = untracked stock.
    pub stock: Option<i64>,
}

/// One dashboard tile: a resource with its occupancy state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTile {
    pub resource: Resource,
    pub session: Option<Session>,
    /// Set when an occupying prepaid session has run past its allowance.
    pub is_overtime: bool,
    pub prepaid: Option<PrepaidStatus>,
}

// =============================================================================
// Resources
// =============================================================================

/// Creates a resource after save-time validation.
///
/// A non-positive rate is rejected here so the pricing engine never
/// sees one.
pub async fn create_resource(db: &Database, input: NewResource) -> ServiceResult<Resource> {
    debug!(name = %input.name, "create_resource");

    validation::validate_name(&input.name).map_err(CoreError::from)?;
    validation::validate_rate_cents(input.rate_cents_per_hour).map_err(CoreError::from)?;

    let now = Utc::now();
    let resource = Resource {
        id: generate_id(),
        name: input.name.trim().to_string(),
        category: input.category,
        rate_cents_per_hour: input.rate_cents_per_hour,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    db.resources().insert(&resource).await?;

    info!(id = %resource.id, name = %resource.name, "Resource created");
    Ok(resource)
}

/// Updates a resource after the same save-time validation.
///
/// Rate changes only affect sessions closed afterwards; a running
/// session is priced with whatever rate its resource carries at close.
pub async fn update_resource(db: &Database, resource: Resource) -> ServiceResult<Resource> {
    validation::validate_name(&resource.name).map_err(CoreError::from)?;
    validation::validate_rate_cents(resource.rate_cents_per_hour).map_err(CoreError::from)?;

    db.resources().update(&resource).await?;
    Ok(resource)
}

/// Retires a resource (soft delete). History is untouched.
pub async fn retire_resource(db: &Database, resource_id: &str) -> ServiceResult<()> {
    db.resources().soft_delete(resource_id).await?;
    info!(id = %resource_id, "Resource retired");
    Ok(())
}

/// Hard-deletes a resource that nothing references.
///
/// Referenced rows are protected: the foreign key rejection becomes a
/// Conflict so the caller can fall back to retirement.
pub async fn delete_resource(db: &Database, resource_id: &str) -> ServiceResult<()> {
    match db.resources().delete(resource_id).await {
        Ok(()) => {
            info!(id = %resource_id, "Resource deleted");
            Ok(())
        }
        Err(DbError::ForeignKeyViolation { .. }) => Err(CoreError::ReferencedByHistory {
            entity: "Resource".to_string(),
            id: resource_id.to_string(),
        }
        .into()),
        Err(err) => Err(err.into()),
    }
}

/// Lists every resource.
pub async fn list_resources(db: &Database) -> ServiceResult<Vec<Resource>> {
    Ok(db.resources().list().await?)
}

/// The session currently occupying a resource, if any.
pub async fn current_session(db: &Database, resource_id: &str) -> ServiceResult<Option<Session>> {
    // Validate the reference itself so a typo'd id reads as an error,
    // not as "free table"
    db.resources()
        .get_by_id(resource_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Resource", resource_id))?;

    Ok(db.resources().current_session(resource_id).await?)
}

// =============================================================================
// Products
// =============================================================================

/// Creates a product after save-time validation.
pub async fn create_product(db: &Database, input: NewProduct) -> ServiceResult<Product> {
    debug!(name = %input.name, "create_product");

    validation::validate_name(&input.name).map_err(CoreError::from)?;
    validation::validate_price_cents(input.price_cents).map_err(CoreError::from)?;
    validation::validate_cost_cents(input.cost_cents).map_err(CoreError::from)?;
    validation::validate_stock(input.stock).map_err(CoreError::from)?;

    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        name: input.name.trim().to_string(),
        price_cents: input.price_cents,
        cost_cents: input.cost_cents,
        stock: input.stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    db.products().insert(&product).await?;

    info!(id = %product.id, name = %product.name, "Product created");
    Ok(product)
}

/// Updates a product after the same save-time validation.
///
/// Price edits never rewrite captured `price_at_order` snapshots.
pub async fn update_product(db: &Database, product: Product) -> ServiceResult<Product> {
    validation::validate_name(&product.name).map_err(CoreError::from)?;
    validation::validate_price_cents(product.price_cents).map_err(CoreError::from)?;
    validation::validate_cost_cents(product.cost_cents).map_err(CoreError::from)?;
    validation::validate_stock(product.stock).map_err(CoreError::from)?;

    db.products().update(&product).await?;
    Ok(product)
}

/// Adds delivered units to a tracked product.
pub async fn restock_product(db: &Database, product_id: &str, delta: i64) -> ServiceResult<()> {
    if delta <= 0 {
        return Err(CoreError::from(cue_core::ValidationError::MustBePositive {
            field: "restock quantity".to_string(),
        })
        .into());
    }

    db.products().restock(product_id, delta).await?;
    info!(id = %product_id, delta = %delta, "Product restocked");
    Ok(())
}

/// Retires a product (soft delete).
pub async fn retire_product(db: &Database, product_id: &str) -> ServiceResult<()> {
    db.products().soft_delete(product_id).await?;
    info!(id = %product_id, "Product retired");
    Ok(())
}

/// Hard-deletes a product that nothing references.
pub async fn delete_product(db: &Database, product_id: &str) -> ServiceResult<()> {
    match db.products().delete(product_id).await {
        Ok(()) => {
            info!(id = %product_id, "Product deleted");
            Ok(())
        }
        Err(DbError::ForeignKeyViolation { .. }) => Err(CoreError::ReferencedByHistory {
            entity: "Product".to_string(),
            id: product_id.to_string(),
        }
        .into()),
        Err(err) => Err(err.into()),
    }
}

/// Lists products available for sale.
pub async fn list_products(db: &Database) -> ServiceResult<Vec<Product>> {
    Ok(db.products().list_active().await?)
}

// =============================================================================
// Dashboard
// =============================================================================

/// Every resource with its occupancy state, for the floor overview.
pub async fn dashboard(db: &Database) -> ServiceResult<Vec<DashboardTile>> {
    dashboard_at(db, Utc::now()).await
}

/// Floor overview with an explicit clock reading.
///
/// Overtime is recomputed from stored start times and the clock on
/// every call - there is no background timer to drift or die.
pub async fn dashboard_at(db: &Database, now: DateTime<Utc>) -> ServiceResult<Vec<DashboardTile>> {
    let resources = db.resources().list().await?;
    let active_sessions = db.sessions().list_active().await?;

    let tiles = resources
        .into_iter()
        .map(|resource| {
            let session = active_sessions
                .iter()
                .find(|session| session.resource_id == resource.id)
                .cloned();

            let prepaid = session
                .as_ref()
                .and_then(|session| pricing::prepaid_status(session, now));

            DashboardTile {
                is_overtime: prepaid.map(|status| status.is_overtime).unwrap_or(false),
                prepaid,
                resource,
                session,
            }
        })
        .collect();

    Ok(tiles)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::session::{start_session_at, StartSession};
    use crate::service::shift::open_shift_at;
    use crate::service::ErrorCode;
    use crate::testutil::{seed_product, seed_resource, test_db};
    use chrono::Duration;
    use cue_core::BillingMode;

    #[tokio::test]
    async fn test_create_resource_validates_rate() {
        let db = test_db().await;

        let err = create_resource(
            &db,
            NewResource {
                name: "Table 1".to_string(),
                category: ResourceCategory::Billiard,
                rate_cents_per_hour: 0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let resource = create_resource(
            &db,
            NewResource {
                name: "Table 1".to_string(),
                category: ResourceCategory::Billiard,
                rate_cents_per_hour: 60_000,
            },
        )
        .await
        .unwrap();
        assert!(resource.is_active);
    }

    #[tokio::test]
    async fn test_create_product_validates() {
        let db = test_db().await;

        let err = create_product(
            &db,
            NewProduct {
                name: "".to_string(),
                price_cents: 250,
                cost_cents: None,
                stock: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = create_product(
            &db,
            NewProduct {
                name: "Cola".to_string(),
                price_cents: -1,
                cost_cents: None,
                stock: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_referenced_resource_is_protected() {
        let db = test_db().await;
        let t0 = Utc::now();
        let table = seed_resource(&db, "Table 1", 60_000).await;
        open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        start_session_at(
            &db,
            StartSession {
                resource_id: table.id.clone(),
                operator_id: "op-1".to_string(),
                mode: BillingMode::Open,
                prepaid_minutes: None,
            },
            t0,
        )
        .await
        .unwrap();

        let err = delete_resource(&db, &table.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        // Retirement still works
        retire_resource(&db, &table.id).await.unwrap();
        let retired = db.resources().get_by_id(&table.id).await.unwrap().unwrap();
        assert!(!retired.is_active);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_resource() {
        let db = test_db().await;
        let table = seed_resource(&db, "Table 1", 60_000).await;

        delete_resource(&db, &table.id).await.unwrap();
        assert!(db.resources().get_by_id(&table.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_session_roundtrip() {
        let db = test_db().await;
        let t0 = Utc::now();
        let table = seed_resource(&db, "Table 1", 60_000).await;
        open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        assert!(current_session(&db, &table.id).await.unwrap().is_none());

        let session = start_session_at(
            &db,
            StartSession {
                resource_id: table.id.clone(),
                operator_id: "op-1".to_string(),
                mode: BillingMode::Open,
                prepaid_minutes: None,
            },
            t0,
        )
        .await
        .unwrap();

        let current = current_session(&db, &table.id).await.unwrap().unwrap();
        assert_eq!(current.id, session.id);

        let err = current_session(&db, "missing").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_dashboard_flags_overtime() {
        let db = test_db().await;
        let t0 = Utc::now();
        let table = seed_resource(&db, "Table 1", 60_000).await;
        let free_table = seed_resource(&db, "Table 2", 60_000).await;
        open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        start_session_at(
            &db,
            StartSession {
                resource_id: table.id.clone(),
                operator_id: "op-1".to_string(),
                mode: BillingMode::Prepaid,
                prepaid_minutes: Some(30),
            },
            t0,
        )
        .await
        .unwrap();

        let tiles = dashboard_at(&db, t0 + Duration::minutes(45)).await.unwrap();

        let occupied = tiles
            .iter()
            .find(|tile| tile.resource.id == table.id)
            .unwrap();
        assert!(occupied.session.is_some());
        assert!(occupied.is_overtime);

        let free = tiles
            .iter()
            .find(|tile| tile.resource.id == free_table.id)
            .unwrap();
        assert!(free.session.is_none());
        assert!(!free.is_overtime);
    }

    #[tokio::test]
    async fn test_restock() {
        let db = test_db().await;
        let cola = seed_product(&db, "Cola", 250, None, Some(2)).await;

        restock_product(&db, &cola.id, 10).await.unwrap();
        let product = db.products().get_by_id(&cola.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Some(12));

        let err = restock_product(&db, &cola.id, 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}

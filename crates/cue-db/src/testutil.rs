//! Shared fixtures for db-layer tests. In-memory SQLite, one
//! connection, migrations applied.

use chrono::Utc;

use crate::pool::{Database, DbConfig};
use crate::repository::generate_id;
use cue_core::{Product, Resource, ResourceCategory};

/// A fresh, isolated, migrated in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Inserts a billiard table at the given hourly rate.
pub(crate) async fn seed_resource(db: &Database, name: &str, rate_cents: i64) -> Resource {
    let now = Utc::now();
    let resource = Resource {
        id: generate_id(),
        name: name.to_string(),
        category: ResourceCategory::Billiard,
        rate_cents_per_hour: rate_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.resources().insert(&resource).await.expect("seed resource");
    resource
}

/// Inserts a bar product.
pub(crate) async fn seed_product(
    db: &Database,
    name: &str,
    price_cents: i64,
    cost_cents: Option<i64>,
    stock: Option<i64>,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        name: name.to_string(),
        price_cents,
        cost_cents,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("seed product");
    product
}

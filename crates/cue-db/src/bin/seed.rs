//! # Seed Data Generator
//!
//! Populates the database with a plausible venue for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./cue.db)
//! cargo run -p cue-db --bin seed
//!
//! # Specify database path
//! cargo run -p cue-db --bin seed -- --db ./data/cue.db
//! ```
//!
//! ## Generated Catalog
//! - Billiard tables 1-6 at two rate tiers
//! - Console stations 1-2
//! - A bar list: drinks and snacks with cost bases; draft tea is
//!   untracked to exercise the null-stock path

use chrono::Utc;
use std::env;
use tracing::info;
use uuid::Uuid;

use cue_core::{Product, Resource, ResourceCategory};
use cue_db::{Database, DbConfig};

/// (name, category, hourly rate in cents)
const RESOURCES: &[(&str, ResourceCategory, i64)] = &[
    ("Table 1", ResourceCategory::Billiard, 60_000),
    ("Table 2", ResourceCategory::Billiard, 60_000),
    ("Table 3", ResourceCategory::Billiard, 60_000),
    ("Table 4", ResourceCategory::Billiard, 50_000),
    ("Table 5", ResourceCategory::Billiard, 50_000),
    ("Table 6 (VIP)", ResourceCategory::Billiard, 80_000),
    ("Console 1", ResourceCategory::Console, 30_000),
    ("Console 2", ResourceCategory::Console, 30_000),
];

/// (name, price cents, cost cents, stock; None stock = untracked)
const PRODUCTS: &[(&str, i64, Option<i64>, Option<i64>)] = &[
    ("Cola 0.5l", 8_000, Some(4_500), Some(48)),
    ("Sparkling Water 0.5l", 5_000, Some(2_500), Some(36)),
    ("Energy Drink", 12_000, Some(7_000), Some(24)),
    ("Chips", 9_000, Some(5_000), Some(30)),
    ("Chocolate Bar", 7_000, Some(4_000), Some(40)),
    ("Sunflower Seeds", 4_000, Some(1_500), Some(50)),
    ("Draft Tea", 3_000, None, None),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./cue.db".to_string());
    info!(path = %db_path, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open database: {err}");
            std::process::exit(1);
        }
    };

    let now = Utc::now();
    let mut created = 0usize;

    for (name, category, rate) in RESOURCES {
        let resource = Resource {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            category: *category,
            rate_cents_per_hour: *rate,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = db.resources().insert(&resource).await {
            eprintln!("failed to insert resource {name}: {err}");
            std::process::exit(1);
        }
        created += 1;
    }

    for (name, price, cost, stock) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            price_cents: *price,
            cost_cents: *cost,
            stock: *stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = db.products().insert(&product).await {
            eprintln!("failed to insert product {name}: {err}");
            std::process::exit(1);
        }
        created += 1;
    }

    info!(created, "Seed complete");
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--db")
        .and_then(|index| args.get(index + 1))
        .cloned()
}

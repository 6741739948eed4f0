//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Once;

use serde::{Deserialize, Serialize};
pub use strata_index::*;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
///
/// Set `STRATA_TEST_LOG` to see index maintenance while debugging a test.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        if std::env::var_os("STRATA_TEST_LOG").is_some() {
            let _ = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::TRACE)
                .with_test_writer()
                .try_init();
        }
    });
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub company: String,
    pub active: bool,
}

impl Record for Customer {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }

    fn schema() -> SchemaBuilder<Self> {
        SchemaBuilder::new()
            .fields(["id", "name", "company", "active"])
            .index("company", |c: &Customer| c.company.clone())
            .index("active", |c: &Customer| c.active)
    }
}

pub fn customer(id: u64, company: &str) -> Customer {
    Customer {
        id,
        name: format!("customer-{}", id),
        company: company.to_string(),
        active: true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub postcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u32,
    pub customer_id: u64,
    pub ship_to: Address,
    pub lines: Vec<String>,
}

impl Record for Order {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn schema() -> SchemaBuilder<Self> {
        SchemaBuilder::new()
            .namespace("orders")
            .fields(["id", "customer_id", "ship_to", "lines"])
            .index("customer_id", |o: &Order| o.customer_id)
            .index("ship_to", |o: &Order| o.ship_to.clone())
    }
}

pub fn order(id: u32, customer_id: u64, city: &str) -> Order {
    Order {
        id,
        customer_id,
        ship_to: Address {
            city: city.to_string(),
            postcode: format!("{}-000", city.len()),
        },
        lines: vec![format!("line-{}", id)],
    }
}

// ============================================================================
// Store helpers
// ============================================================================

/// Store with the schema for `R` created.
pub fn store_with<R: Record>(repo: &IndexedRepository<R>) -> MemoryStore {
    init_tracing();
    let store = MemoryStore::new();
    store
        .update(|tx| repo.create_schema(tx))
        .expect("Failed to create schema");
    store
}

/// Customer repository over a fresh store.
pub fn customers() -> (MemoryStore, IndexedRepository<Customer>) {
    let repo = IndexedRepository::<Customer>::new().expect("Customer schema is valid");
    (store_with(&repo), repo)
}

/// Order repository over a fresh store.
pub fn orders() -> (MemoryStore, IndexedRepository<Order>) {
    let repo = IndexedRepository::<Order>::new().expect("Order schema is valid");
    (store_with(&repo), repo)
}

pub fn ids_of<R: Record>(records: &[R]) -> Vec<R::Id> {
    records.iter().map(Record::id).collect()
}

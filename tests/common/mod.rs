// Not every helper is used by every test binary
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::test::TestRequest;
use opensplit_ledger::schemas::UserId;
use opensplit_ledger::store::{LedgerStore, MemoryStore};
use serde_json::{json, Value};

pub fn memory_store() -> Arc<dyn LedgerStore> {
    Arc::new(MemoryStore::new())
}

pub fn add_user(name: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "name": name }))
}

pub fn add_expense(payer_id: UserId, amount: f64, participants: &[UserId]) -> TestRequest {
    TestRequest::post().uri("/api/expenses").set_json(json!({
        "payer_id": payer_id,
        "amount": amount,
        "participants": participants,
    }))
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri)
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri)
}

/// `(id, balance)` pairs from a `/api/summary` body.
pub fn balances(summary: &Value) -> Vec<(i64, f64)> {
    summary["users"]
        .as_array()
        .expect("users array")
        .iter()
        .map(|user| {
            (
                user["id"].as_i64().expect("user id"),
                user["balance"].as_f64().expect("balance"),
            )
        })
        .collect()
}

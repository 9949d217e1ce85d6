//! Shared fixtures for the bot integration tests

#![allow(dead_code)]

use std::sync::Arc;

use santacore::storage::participants;
use santacore::{create_pool, CompletedRegistration, DbPool, DeliveryOption, RegistrationEvent, RegistrationFlow, Transition};
use teloxide::types::User;
use teloxide_tests::MockUser;
use tempfile::TempDir;

pub const USER_ID: u64 = 42;
pub const ADMIN_ID: u64 = 1001;

/// A throw-away SQLite file with migrations applied. Keep the `TempDir` alive.
pub fn test_pool() -> (TempDir, Arc<DbPool>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("santa.db");
    let pool = create_pool(path.to_str().expect("utf-8 path")).expect("Failed to create test database");
    (dir, Arc::new(pool))
}

pub fn user(id: u64) -> User {
    MockUser::new().id(id).build()
}

pub fn sample_registration(address: &str) -> CompletedRegistration {
    CompletedRegistration {
        ifo: "Ivan".to_string(),
        delivery: DeliveryOption::Pickup,
        address: address.to_string(),
        phone_number: "+1000".to_string(),
        comment: None,
    }
}

/// Inserts a participant directly and returns its id.
pub fn register(pool: &DbPool, telegram_user_id: i64, address: &str) -> i64 {
    let conn = pool.get().expect("connection");
    participants::save_registration(&conn, telegram_user_id, None, &sample_registration(address))
        .expect("Failed to insert participant")
        .participant_id
}

pub fn participant_count(pool: &DbPool) -> i64 {
    let conn = pool.get().expect("connection");
    participants::count(&conn).expect("count")
}

/// Drives a fresh flow through the given events, expecting each to advance or update.
pub fn flow_after(events: Vec<RegistrationEvent>) -> RegistrationFlow {
    let mut flow = RegistrationFlow::start();
    for event in events {
        flow = match flow.handle(event) {
            Transition::Advanced(next) | Transition::Updated(next) => next,
            other => panic!("unexpected transition {:?}", other),
        };
    }
    flow
}

pub fn text(s: &str) -> RegistrationEvent {
    RegistrationEvent::Text(s.to_string())
}

/// A flow waiting for confirmation of Ivan / Main St 1 / +1000 / no comment.
pub fn flow_at_confirm(address: &str) -> RegistrationFlow {
    flow_after(vec![
        text("Ivan"),
        text(address),
        text("+1000"),
        RegistrationEvent::SkipComment,
    ])
}

/// True if `text` contains one of the localized variants.
pub fn is_one_of(text: &str, variants: &[&str]) -> bool {
    variants.iter().any(|v| text.contains(v))
}

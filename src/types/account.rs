//! Account holder data structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique account identifier.
pub type AccountId = Uuid;

/// Role tag attached to an account at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// An account holder with a current balance.
///
/// The balance is non-negative by construction: the coordinator rejects any
/// outgoing transaction that would overdraw it, and only the coordinator
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub balance: Decimal,
    pub role: Role,
}

impl Account {
    pub fn new(username: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            balance,
            role: Role::User,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

pub type UserId = String;

/// Reference to an app user. Two references are the same user when their ids
/// match, whatever display name they happened to be fetched with.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
}

impl PartialEq for UserRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserRef {}

impl Hash for UserRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub payers: Vec<UserRef>,
}

impl FoodItem {
    /// Whether the given user is liable for this item. Payers are stored in a
    /// Vec so their order stays stable, but membership is by id and a
    /// duplicated entry never counts twice.
    pub fn has_payer(&self, user: &str) -> bool {
        self.payers.iter().any(|payer| payer.id == user)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Money owed by one user to the submitter of a store. The user is never the
/// submitter and a store keeps at most one debtor per user id.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Debtor {
    pub id: String,
    pub user: UserRef,
    pub date_created: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FoodStore {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub address: String,
    pub submitter: UserRef,
    pub date_created: DateTime<Utc>,
    pub items: Vec<FoodItem>,
    pub debtors: Vec<Debtor>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FoodTrip {
    pub id: String,
    pub name: String,
    pub location: String,
    pub members: Vec<UserRef>,
    pub date_created: DateTime<Utc>,
}

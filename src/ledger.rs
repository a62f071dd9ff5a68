use chrono::{DateTime, Utc};

use crate::debtors::resolve_debtors;
use crate::errors::{Result, SplitError};
use crate::schemas::{FoodItem, FoodStore, UserRef};

/// Rejects items the store form must never accept. Malformed items are
/// refused at insertion, not coerced.
pub fn validate_item(item: &FoodItem) -> Result<()> {
    let reason = if item.price < 0.0 {
        "negative price"
    } else if !item.price.is_finite() {
        "price is not a finite number"
    } else if item.payers.is_empty() {
        "no payers selected"
    } else {
        return Ok(());
    };
    Err(SplitError::InvalidItem {
        name: item.name.clone(),
        reason,
    })
}

/// Ordered sequence of food items for one store being composed or edited.
#[derive(Debug, Default, Clone)]
pub struct ItemLedger {
    items: Vec<FoodItem>,
}

impl ItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from an already-collected item list, e.g. a submitted
    /// store form, validating every entry.
    pub fn from_items(items: Vec<FoodItem>) -> Result<Self> {
        let mut ledger = Self::new();
        for item in items {
            ledger.add_item(item)?;
        }
        Ok(ledger)
    }

    pub fn add_item(&mut self, item: FoodItem) -> Result<()> {
        validate_item(&item)?;
        self.items.push(item);
        Ok(())
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }
}

/// One session per in-progress store creation or edit. It owns the ledger
/// and carries the current-user identity as injected state; the identity
/// lookup is asynchronous in the app, so the submitter may arrive after the
/// session opens.
#[derive(Debug, Default)]
pub struct StoreSession {
    ledger: ItemLedger,
    submitter: Option<UserRef>,
}

impl StoreSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submitter(submitter: UserRef) -> Self {
        Self {
            ledger: ItemLedger::new(),
            submitter: Some(submitter),
        }
    }

    pub fn resolve_submitter(&mut self, submitter: UserRef) {
        self.submitter = Some(submitter);
    }

    pub fn add_item(&mut self, item: FoodItem) -> Result<()> {
        self.ledger.add_item(item)
    }

    pub fn items(&self) -> &[FoodItem] {
        self.ledger.items()
    }

    /// Turns the session into a store ready to persist, resolving the debtor
    /// ledger. Fails with `MissingSubmitter` while the identity fetch is
    /// still pending; the computation is pure and can be retried once it
    /// lands.
    pub fn finalize(
        &self,
        trip_id: &str,
        store_id: &str,
        name: &str,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<FoodStore> {
        let debtors = resolve_debtors(self.ledger.items(), self.submitter.as_ref(), now)?;
        let submitter = self
            .submitter
            .clone()
            .ok_or(SplitError::MissingSubmitter)?;
        Ok(FoodStore {
            id: store_id.to_string(),
            trip_id: trip_id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            submitter,
            date_created: now,
            items: self.ledger.items().to_vec(),
            debtors,
        })
    }
}

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::errors::{Result, SplitError};
use crate::schemas::{Debtor, FoodItem, PaymentStatus, UserRef};

/// Builds the debtor records for a newly submitted store: one `pending`
/// debtor per distinct user who pays for at least one item and is not the
/// submitter, in first-appearance order across the items.
///
/// `submitter` is `None` while the identity provider lookup is still in
/// flight; resolving then is an error the caller retries after, not a state
/// to default around. The ids are left empty like the rest of the store
/// form; the persistence layer assigns them at save time.
pub fn resolve_debtors(
    items: &[FoodItem],
    submitter: Option<&UserRef>,
    now: DateTime<Utc>,
) -> Result<Vec<Debtor>> {
    let submitter = submitter.ok_or(SplitError::MissingSubmitter)?;

    let mut debtors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for item in items {
        for payer in &item.payers {
            if payer.id == submitter.id || !seen.insert(payer.id.as_str()) {
                continue;
            }
            debtors.push(Debtor {
                id: String::new(),
                user: payer.clone(),
                date_created: now,
                payment_status: PaymentStatus::Pending,
            });
        }
    }
    Ok(debtors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserRef {
        UserRef {
            id: id.to_string(),
            name: id.to_uppercase(),
        }
    }

    fn item(id: &str, price: f64, payers: &[&str]) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            name: format!("item {id}"),
            price,
            payers: payers.iter().map(|id| user(id)).collect(),
        }
    }

    #[test]
    fn one_debtor_per_distinct_payer() {
        let items = [
            item("1", 30.0, &["a", "b", "c"]),
            item("2", 10.0, &["b"]),
            item("3", 5.0, &["c", "b"]),
        ];
        let debtors = resolve_debtors(&items, Some(&user("a")), Utc::now()).unwrap();

        let ids: Vec<_> = debtors.iter().map(|d| d.user.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(debtors
            .iter()
            .all(|d| d.payment_status == PaymentStatus::Pending));
    }

    #[test]
    fn submitter_is_never_a_debtor() {
        let items = [item("1", 30.0, &["a", "b"])];
        let debtors = resolve_debtors(&items, Some(&user("a")), Utc::now()).unwrap();
        assert!(debtors.iter().all(|d| d.user.id != "a"));
    }

    #[test]
    fn submitter_only_items_produce_no_debtors() {
        let items = [item("1", 30.0, &["a"]), item("2", 4.0, &["a"])];
        let debtors = resolve_debtors(&items, Some(&user("a")), Utc::now()).unwrap();
        assert!(debtors.is_empty());
    }

    #[test]
    fn empty_ledger_produces_no_debtors() {
        let debtors = resolve_debtors(&[], Some(&user("a")), Utc::now()).unwrap();
        assert!(debtors.is_empty());
    }

    #[test]
    fn order_is_first_appearance_across_items() {
        let items = [item("1", 1.0, &["c"]), item("2", 1.0, &["b", "c"])];
        let debtors = resolve_debtors(&items, Some(&user("a")), Utc::now()).unwrap();
        let ids: Vec<_> = debtors.iter().map(|d| d.user.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn rerunning_yields_the_same_ledger() {
        let items = [item("1", 30.0, &["a", "b", "c"]), item("2", 10.0, &["b"])];
        let now = Utc::now();
        let first = resolve_debtors(&items, Some(&user("a")), now).unwrap();
        let second = resolve_debtors(&items, Some(&user("a")), now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unresolved_submitter_is_an_error() {
        let items = [item("1", 30.0, &["a"])];
        assert_eq!(
            resolve_debtors(&items, None, Utc::now()),
            Err(SplitError::MissingSubmitter)
        );
    }
}

use std::collections::{HashMap, HashSet};

use crate::schemas::{FoodItem, UserId};

pub type UserTotals = HashMap<UserId, f64>;

/// How much the given user owes across the store: the sum of the full price
/// of every item they are a payer on. Liability is shared, not divided; a
/// $30 item with three payers means each of the three owes $30 for it.
pub fn total_for(items: &[FoodItem], user: &str) -> f64 {
    items
        .iter()
        .filter(|item| item.has_payer(user))
        .map(|item| item.price)
        .sum()
}

/// Total store cost: every item price counted exactly once, however many
/// payers the item has.
pub fn grand_total(items: &[FoodItem]) -> f64 {
    items.iter().map(|item| item.price).sum()
}

/// Subtotal per user, for everyone who pays for at least one item.
pub fn totals_by_user(items: &[FoodItem]) -> UserTotals {
    let mut totals = UserTotals::new();
    for item in items {
        let mut seen = HashSet::new();
        for payer in &item.payers {
            // A user id repeated within one payer set counts once
            if !seen.insert(payer.id.as_str()) {
                continue;
            }
            totals
                .entry(payer.id.clone())
                .and_modify(|total| *total += item.price)
                .or_insert(item.price);
        }
    }
    totals
}

/// Amounts accumulate unrounded; rounding happens here, at display time only.
pub fn format_currency(amount: f64) -> String {
    format!("$ {:.2}", round_to_2_decimals(amount))
}

fn round_to_2_decimals(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::UserRef;

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
    fn totals_use_full_price_per_payer() {
        let items = [item("1", 30.0, &["a", "b", "c"]), item("2", 10.0, &["b"])];

        assert_eq!(total_for(&items, "a"), 30.0);
        assert_eq!(total_for(&items, "b"), 40.0);
        assert_eq!(total_for(&items, "c"), 30.0);
        assert_eq!(grand_total(&items), 40.0);
    }

    #[test]
    fn empty_store_totals_zero() {
        assert_eq!(grand_total(&[]), 0.0);
        assert_eq!(total_for(&[], "a"), 0.0);
        assert!(totals_by_user(&[]).is_empty());
    }

    #[test]
    fn non_payer_owes_nothing() {
        let items = [item("1", 12.5, &["a"])];
        assert_eq!(total_for(&items, "b"), 0.0);
        assert!(!totals_by_user(&items).contains_key("b"));
    }

    #[test]
    fn duplicated_payer_entry_counts_once() {
        let items = [item("1", 15.0, &["a", "a"])];
        assert_eq!(total_for(&items, "a"), 15.0);
        assert_eq!(totals_by_user(&items)["a"], 15.0);
    }

    #[test]
    fn totals_by_user_matches_total_for() {
        let items = [
            item("1", 7.25, &["a", "b"]),
            item("2", 3.1, &["b", "c"]),
            item("3", 0.0, &["a"]),
        ];
        let totals = totals_by_user(&items);
        for id in ["a", "b", "c"] {
            assert_eq!(totals.get(id).copied().unwrap_or(0.0), total_for(&items, id));
        }
    }

    #[test]
    fn formatting_rounds_to_two_places() {
        assert_eq!(format_currency(0.0), "$ 0.00");
        assert_eq!(format_currency(0.125), "$ 0.13");
        assert_eq!(format_currency(10.0 / 3.0), "$ 3.33");
    }
}

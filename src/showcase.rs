//! Featured-product selection for the storefront home page.
//!
//! The admin picks up to five products per category; the picks are stored
//! as JSON id lists under the `showcase_sele` / `showcase_vites` settings
//! keys. Lists may contain holes (zeros) and ids that were deleted since
//! the list was saved — resolution tolerates both.

use serde::{Deserialize, Serialize};

use crate::models::product::Product;
use crate::store::{Store, StoreError};

/// Slots per category on the home page.
pub const SHOWCASE_SLOTS: usize = 5;

/// Settings keys holding the per-category id lists.
pub const SHOWCASE_KEYS: &[(&str, &str)] = &[
    ("sele", "showcase_sele"),
    ("vites", "showcase_vites"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ShowcaseAssignment {
    pub product_id: i64,
    /// 1-indexed slot within the source list. Holes keep their slot.
    pub position: i64,
    pub list: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowcaseFailure {
    pub product_id: i64,
    pub position: i64,
    pub list: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ShowcaseOutcome {
    /// Products whose showcase flag was cleared in the reset phase.
    pub cleared: usize,
    pub applied: usize,
    pub failed: Vec<ShowcaseFailure>,
}

#[derive(Debug, Deserialize)]
struct RawIds(Vec<serde_json::Value>);

/// Decode a stored showcase list. Missing key or malformed JSON yields an
/// empty list — the storefront renders an empty section, it never errors.
pub fn parse_ids(raw: Option<String>) -> Vec<i64> {
    let raw = match raw {
        Some(r) => r,
        None => return vec![],
    };
    match serde_json::from_str::<RawIds>(&raw) {
        Ok(RawIds(values)) => values
            .into_iter()
            .map(|v| v.as_i64().unwrap_or(0))
            .collect(),
        Err(_) => vec![],
    }
}

/// Resolve a stored list to product records: stored order, holes and
/// dangling ids skipped, inactive products skipped, capped at
/// [`SHOWCASE_SLOTS`].
pub fn resolve(store: &dyn Store, key: &str) -> Vec<Product> {
    let ids = parse_ids(store.setting_get(key));
    let mut out = Vec::new();
    for id in ids {
        if id <= 0 {
            continue;
        }
        if let Some(product) = store.product_get_by_id(id) {
            if product.is_active {
                out.push(product);
            }
        }
        if out.len() == SHOWCASE_SLOTS {
            break;
        }
    }
    out
}

/// Backfill the per-product `is_showcase`/`showcase_order` fields from the
/// JSON lists: clear every flag, then apply both lists in order, 1-indexed.
/// The outcome reports exactly which entries could not be applied.
pub fn reset_and_assign(store: &dyn Store) -> Result<ShowcaseOutcome, StoreError> {
    let mut assignments: Vec<ShowcaseAssignment> = Vec::new();
    for (list, key) in SHOWCASE_KEYS {
        let ids = parse_ids(store.setting_get(key));
        for (i, id) in ids.iter().enumerate() {
            if *id <= 0 {
                continue;
            }
            assignments.push(ShowcaseAssignment {
                product_id: *id,
                position: i as i64 + 1,
                list: (*list).to_string(),
            });
        }
    }
    store.showcase_reset_and_assign(&assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_handles_holes_and_numbers() {
        assert_eq!(
            parse_ids(Some("[5, 0, 3, 9999, 2]".to_string())),
            vec![5, 0, 3, 9999, 2]
        );
    }

    #[test]
    fn parse_ids_tolerates_nulls() {
        assert_eq!(
            parse_ids(Some("[1, null, 2]".to_string())),
            vec![1, 0, 2]
        );
    }

    #[test]
    fn parse_ids_empty_on_garbage() {
        assert!(parse_ids(Some("not json".to_string())).is_empty());
        assert!(parse_ids(Some("{\"a\":1}".to_string())).is_empty());
        assert!(parse_ids(None).is_empty());
    }
}

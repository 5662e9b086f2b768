use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

/// Repeating the current sort key flips ascending to descending; any other
/// key starts over ascending.
pub fn request_sort(current: Option<&SortConfig>, key: &str) -> SortConfig {
    let direction = match current {
        Some(c) if c.key == key && c.direction == SortDirection::Ascending => {
            SortDirection::Descending
        }
        _ => SortDirection::Ascending,
    };
    SortConfig {
        key: key.to_string(),
        direction,
    }
}

/// Filters `items` to those where any searchable field contains
/// `search_term` (case-insensitive substring over the field's display
/// form), then sorts by `sort` with null/absent values last in both
/// directions. Pure function of its inputs.
pub fn derive_view(
    items: &[Value],
    searchable_fields: &[&str],
    search_term: &str,
    sort: Option<&SortConfig>,
) -> Vec<Value> {
    let term = search_term.trim().to_lowercase();
    let mut view: Vec<Value> = if term.is_empty() {
        items.to_vec()
    } else {
        items
            .iter()
            .filter(|item| {
                searchable_fields.iter().any(|key| {
                    field_text(item, key)
                        .map(|s| s.to_lowercase().contains(&term))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect()
    };

    if let Some(cfg) = sort {
        view.sort_by(|a, b| {
            let ord = compare_values(a.get(&cfg.key), b.get(&cfg.key));
            match (ord, cfg.direction) {
                // Null-last is direction-independent.
                (CmpOutcome::NullsDecided(o), _) => o,
                (CmpOutcome::Ordered(o), SortDirection::Ascending) => o,
                (CmpOutcome::Ordered(o), SortDirection::Descending) => o.reverse(),
            }
        });
    }
    view
}

fn field_text(item: &Value, key: &str) -> Option<String> {
    match item.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    }
}

enum CmpOutcome {
    /// At least one side was null/absent; the ordering already places it last.
    NullsDecided(Ordering),
    Ordered(Ordering),
}

/// Numbers compare numerically, strings lexicographically. Mixed types get
/// a fixed rank (bool < number < string < everything else) so the sort
/// stays total where the source relied on loose relational semantics.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOutcome {
    let a_null = matches!(a, None | Some(Value::Null));
    let b_null = matches!(b, None | Some(Value::Null));
    match (a_null, b_null) {
        (true, true) => return CmpOutcome::NullsDecided(Ordering::Equal),
        (true, false) => return CmpOutcome::NullsDecided(Ordering::Greater),
        (false, true) => return CmpOutcome::NullsDecided(Ordering::Less),
        (false, false) => {}
    }
    let (Some(a), Some(b)) = (a, b) else {
        return CmpOutcome::NullsDecided(Ordering::Equal);
    };
    let ord = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    };
    CmpOutcome::Ordered(ord)
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({ "name": "Bob", "amount": 50 }),
            json!({ "name": "Amy", "amount": 20 }),
            json!({ "name": "Cid", "amount": null }),
        ]
    }

    fn asc(key: &str) -> SortConfig {
        SortConfig {
            key: key.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    fn names(view: &[Value]) -> Vec<&str> {
        view.iter()
            .map(|v| v.get("name").and_then(Value::as_str).unwrap())
            .collect()
    }

    #[test]
    fn empty_term_keeps_everything_in_order() {
        let items = people();
        let view = derive_view(&items, &["name"], "", None);
        assert_eq!(names(&view), vec!["Bob", "Amy", "Cid"]);
        let view = derive_view(&items, &["name"], "   ", None);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let items = vec![json!({ "name": "Jane Smith" })];
        assert_eq!(derive_view(&items, &["name"], "jane", None).len(), 1);
        assert_eq!(derive_view(&items, &["name"], "SMITH", None).len(), 1);
        assert_eq!(derive_view(&items, &["name"], "xyz", None).len(), 0);
    }

    #[test]
    fn search_matches_any_searchable_field_and_coerces_numbers() {
        let items = people();
        let view = derive_view(&items, &["name", "amount"], "50", None);
        assert_eq!(names(&view), vec!["Bob"]);
        // "am" matches Amy's name, case-insensitively.
        let view = derive_view(&items, &["name"], "am", None);
        assert_eq!(names(&view), vec!["Amy"]);
    }

    #[test]
    fn null_fields_never_match() {
        let items = people();
        let view = derive_view(&items, &["amount"], "null", None);
        assert!(view.is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        let items = people();
        let once = derive_view(&items, &["name"], "b", None);
        let twice = derive_view(&once, &["name"], "b", None);
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_places_nulls_last_in_both_directions() {
        let items = people();
        let view = derive_view(&items, &["name"], "", Some(&asc("amount")));
        assert_eq!(names(&view), vec!["Amy", "Bob", "Cid"]);

        let desc = SortConfig {
            key: "amount".to_string(),
            direction: SortDirection::Descending,
        };
        let view = derive_view(&items, &["name"], "", Some(&desc));
        assert_eq!(names(&view), vec!["Bob", "Amy", "Cid"]);
    }

    #[test]
    fn sort_by_integer_key_nulls_last() {
        let items = vec![json!({ "k": 1 }), json!({ "k": null }), json!({ "k": 2 })];
        let view = derive_view(&items, &[], "", Some(&asc("k")));
        let ks: Vec<Option<i64>> = view.iter().map(|v| v.get("k").and_then(Value::as_i64)).collect();
        assert_eq!(ks, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn strings_sort_lexicographically() {
        let items = people();
        let view = derive_view(&items, &[], "", Some(&asc("name")));
        assert_eq!(names(&view), vec!["Amy", "Bob", "Cid"]);
    }

    #[test]
    fn request_sort_toggles_on_repeated_key() {
        let first = request_sort(None, "name");
        assert_eq!(first.direction, SortDirection::Ascending);
        let second = request_sort(Some(&first), "name");
        assert_eq!(second.direction, SortDirection::Descending);
        // A third request on the same key goes back to ascending.
        let third = request_sort(Some(&second), "name");
        assert_eq!(third.direction, SortDirection::Ascending);
        // Switching keys resets to ascending.
        let other = request_sort(Some(&second), "email");
        assert_eq!(other.key, "email");
        assert_eq!(other.direction, SortDirection::Ascending);
    }
}

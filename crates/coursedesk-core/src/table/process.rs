// ── Client-side post-processing ──
//
// Filters and sorts one page of rows locally when the server has not
// already done so. Filtering compares lowercased stringified cells; sorting
// is a stable multi-key sort in natural order.

use std::cmp::Ordering;

use serde_json::Value;

use coursedesk_api::{FilterRule, Relation, SortOrder, SortRule};

/// Apply `filters` (all must match) then `sorters` (in sequence) to `rows`.
///
/// With no active filters and no sorters the output equals the input.
pub fn process(rows: &[Value], filters: &[FilterRule], sorters: &[SortRule]) -> Vec<Value> {
    let active: Vec<&FilterRule> = filters.iter().filter(|f| f.is_active()).collect();

    let mut out: Vec<Value> = rows
        .iter()
        .filter(|row| active.iter().all(|f| matches_filter(row, f)))
        .cloned()
        .collect();

    if !sorters.is_empty() {
        insertion_sort(&mut out, |a, b| compare_rows(a, b, sorters));
    }
    out
}

/// Stable in-place sort. Cross-type ties make `compare` intransitive, so
/// this must not assume a total order.
fn insertion_sort<F>(rows: &mut [Value], mut compare: F)
where
    F: FnMut(&Value, &Value) -> Ordering,
{
    for i in 1..rows.len() {
        let mut j = i;
        while j > 0 && compare(&rows[j - 1], &rows[j]) == Ordering::Greater {
            rows.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn matches_filter(row: &Value, filter: &FilterRule) -> bool {
    if filter.column.is_empty() {
        return true;
    }
    let cell = cell_text(row.get(&filter.column)).to_lowercase();
    let needle = filter.value.to_lowercase();
    match filter.relation {
        Relation::Equals => cell == needle,
        Relation::StartsWith => cell.starts_with(&needle),
        Relation::Contains => cell.contains(&needle),
    }
}

/// Stringify a cell for comparison and display. Missing and `null` cells
/// are empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn compare_rows(a: &Value, b: &Value, sorters: &[SortRule]) -> Ordering {
    for sorter in sorters {
        let ordering = natural_order(a.get(&sorter.column), b.get(&sorter.column));
        let ordering = match sorter.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Natural ordering within one JSON type. Values of different types (and
/// missing values) tie.
fn natural_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({ "name": "Anna", "age": 2 }),
            json!({ "name": "Bob", "age": 3 }),
            json!({ "name": "Carl", "age": 1 }),
        ]
    }

    fn column(rows: &[Value], key: &str) -> Vec<Value> {
        rows.iter().map(|r| r[key].clone()).collect()
    }

    #[test]
    fn identity_without_rules() {
        assert_eq!(process(&people(), &[], &[]), people());
    }

    #[test]
    fn contains_is_case_insensitive() {
        let out = process(&people(), &[FilterRule::contains("name", "an")], &[]);
        assert_eq!(column(&out, "name"), vec![json!("Anna")]);
    }

    #[test]
    fn equals_and_starts_with() {
        let eq = process(&people(), &[FilterRule::new("name", Relation::Equals, "bob")], &[]);
        assert_eq!(column(&eq, "name"), vec![json!("Bob")]);

        let sw = process(&people(), &[FilterRule::new("name", Relation::StartsWith, "c")], &[]);
        assert_eq!(column(&sw, "name"), vec![json!("Carl")]);
    }

    #[test]
    fn numbers_are_stringified_for_filters() {
        let out = process(&people(), &[FilterRule::new("age", Relation::Equals, "3")], &[]);
        assert_eq!(column(&out, "name"), vec![json!("Bob")]);
    }

    #[test]
    fn inert_filters_are_ignored() {
        let out = process(&people(), &[FilterRule::contains("name", "")], &[]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn desc_sort() {
        let out = process(&people(), &[], &[SortRule::desc("age")]);
        assert_eq!(column(&out, "age"), vec![json!(3), json!(2), json!(1)]);
    }

    #[test]
    fn multi_key_sort_is_stable() {
        let rows = vec![
            json!({ "id": 1, "group": "b", "rank": 2 }),
            json!({ "id": 2, "group": "a", "rank": 1 }),
            json!({ "id": 3, "group": "b", "rank": 1 }),
            json!({ "id": 4, "group": "a", "rank": 1 }),
        ];
        let out = process(&rows, &[], &[SortRule::asc("group"), SortRule::asc("rank")]);
        assert_eq!(column(&out, "id"), vec![json!(2), json!(4), json!(3), json!(1)]);
    }

    #[test]
    fn mixed_types_and_missing_values_tie() {
        let rows = vec![
            json!({ "id": 1, "v": "text" }),
            json!({ "id": 2, "v": 5 }),
            json!({ "id": 3 }),
            json!({ "id": 4, "v": null }),
        ];
        let out = process(&rows, &[], &[SortRule::asc("v")]);
        assert_eq!(column(&out, "id"), vec![json!(1), json!(2), json!(3), json!(4)]);
    }
}

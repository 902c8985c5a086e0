// ── Location binding ──
//
// Table state mirrored into a route query string:
//
//   page=2&filters=name:contains:an&sorters=name:asc&sorters=created_at:desc
//
// Repeated keys keep sorter order. `sorters=` (empty) means "explicitly no
// sorting" and is distinct from an absent key, which means "kind default".
// The older mapping form `filters={"name":"an"}&sorters={"name":"asc"}` is
// still accepted on read.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use coursedesk_api::{FilterRule, Relation, SortOrder, SortRule};

use super::state::TableState;

pub const PAGE_KEY: &str = "page";
pub const FILTERS_KEY: &str = "filters";
pub const SORTERS_KEY: &str = "sorters";

// ── Location ─────────────────────────────────────────────────────────

/// Somewhere a query string lives (a route, a browser URL, a CLI flag).
pub trait Location: Send + Sync {
    /// Current query string, without the leading `?`.
    fn query(&self) -> String;

    /// Replace the query string in place, without adding a history entry.
    fn replace_query(&self, query: &str);
}

/// In-process route (`/users?page=2`), shared by clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    inner: Arc<Mutex<Route>>,
}

#[derive(Debug, Clone, Default)]
struct Route {
    path: String,
    query: String,
}

impl MemoryLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self::from_parts(path.into(), String::new())
    }

    /// Parse `"/users?page=2"` into path and query.
    pub fn parse(route: &str) -> Self {
        match route.split_once('?') {
            Some((path, query)) => Self::from_parts(path.to_owned(), query.to_owned()),
            None => Self::from_parts(route.to_owned(), String::new()),
        }
    }

    fn from_parts(path: String, query: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Route { path, query })),
        }
    }

    pub fn path(&self) -> String {
        self.lock().path.clone()
    }

    /// Full route, `path?query` (or just `path` when the query is empty).
    pub fn route(&self) -> String {
        let route = self.lock();
        if route.query.is_empty() {
            route.path.clone()
        } else {
            format!("{}?{}", route.path, route.query)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Route> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> String {
        self.lock().query.clone()
    }

    fn replace_query(&self, query: &str) {
        query.trim_start_matches('?').clone_into(&mut self.lock().query);
    }
}

// ── Encoding ─────────────────────────────────────────────────────────

/// Encode `state` as a query string.
///
/// Inert filters are omitted. Sorters equal to `defaults` are omitted;
/// an empty sorter list that differs from the defaults is written as
/// `sorters=` so a reload does not resurrect the default sort.
pub fn encode(state: &TableState, defaults: &[SortRule]) -> String {
    let mut out = url::form_urlencoded::Serializer::new(String::new());
    append_state(&mut out, state, defaults);
    out.finish()
}

/// Rewrite the table keys of `existing`, keeping unrelated parameters.
pub fn merge(existing: &str, state: &TableState, defaults: &[SortRule]) -> String {
    let mut out = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(existing.trim_start_matches('?').as_bytes()) {
        if !is_table_key(&key) {
            out.append_pair(&key, &value);
        }
    }
    append_state(&mut out, state, defaults);
    out.finish()
}

fn is_table_key(key: &str) -> bool {
    matches!(key, PAGE_KEY | FILTERS_KEY | SORTERS_KEY)
}

fn append_state(
    out: &mut url::form_urlencoded::Serializer<'_, String>,
    state: &TableState,
    defaults: &[SortRule],
) {
    out.append_pair(PAGE_KEY, &state.page.to_string());

    for filter in state.filters.iter().filter(|f| f.is_active()) {
        out.append_pair(
            FILTERS_KEY,
            &format!("{}:{}:{}", filter.column, filter.relation, filter.value),
        );
    }

    if state.sorters.as_slice() == defaults {
        return;
    }
    if state.sorters.is_empty() {
        out.append_pair(SORTERS_KEY, "");
    }
    for sorter in &state.sorters {
        out.append_pair(SORTERS_KEY, &format!("{}:{}", sorter.column, sorter.order));
    }
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode a query string into table state. Never fails: malformed entries
/// are skipped, a bad page falls back to 1.
pub fn decode(query: &str, defaults: &[SortRule]) -> TableState {
    let mut page = 1;
    let mut filters = Vec::new();
    let mut sorters: Option<Vec<SortRule>> = None;

    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            PAGE_KEY => {
                page = value.trim().parse::<u32>().ok().filter(|&p| p >= 1).unwrap_or(1);
            }
            FILTERS_KEY => filters.extend(decode_filters(&value)),
            SORTERS_KEY => sorters
                .get_or_insert_with(Vec::new)
                .extend(decode_sorters(&value)),
            _ => {}
        }
    }

    TableState {
        page,
        filters,
        sorters: sorters.unwrap_or_else(|| defaults.to_vec()),
    }
}

fn decode_filters(raw: &str) -> Vec<FilterRule> {
    let raw = raw.trim();
    if raw.starts_with('{') {
        return ordered_object(raw)
            .into_iter()
            .map(|(column, value)| FilterRule::contains(column, json_text(&value)))
            .filter(|f| !f.column.is_empty() && f.is_active())
            .collect();
    }

    let Some((column, rest)) = raw.split_once(':') else {
        return Vec::new();
    };
    let rule = match rest.split_once(':') {
        Some((relation, value)) => match relation.parse::<Relation>() {
            Ok(relation) => FilterRule::new(column, relation, value),
            Err(_) => FilterRule::contains(column, rest),
        },
        None => FilterRule::contains(column, rest),
    };

    if rule.column.is_empty() || !rule.is_active() {
        Vec::new()
    } else {
        vec![rule]
    }
}

fn decode_sorters(raw: &str) -> Vec<SortRule> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if raw.starts_with('{') {
        return ordered_object(raw)
            .into_iter()
            .filter_map(|(column, order)| {
                let order = order.as_str()?.parse::<SortOrder>().ok()?;
                Some(SortRule { column, order })
            })
            .collect();
    }

    let (column, order) = match raw.rsplit_once(':') {
        Some((column, order)) => match order.parse::<SortOrder>() {
            Ok(order) => (column, order),
            Err(_) => return Vec::new(),
        },
        None => (raw, SortOrder::Asc),
    };
    if column.is_empty() {
        return Vec::new();
    }
    vec![SortRule {
        column: column.to_owned(),
        order,
    }]
}

/// Stringify a JSON scalar the way a URL value would read.
fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a JSON object keeping key order; anything else yields nothing.
fn ordered_object(raw: &str) -> Vec<(String, Value)> {
    serde_json::from_str::<OrderedObject>(raw)
        .map(|o| o.0)
        .unwrap_or_default()
}

struct OrderedObject(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(OrderedObject(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

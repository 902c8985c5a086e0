// Response envelope normalization.
//
// The admin API answers in several shapes depending on the endpoint:
//
//   { records: [..], current_page, last_page, page_size, total_count }
//   { user: {..} } / { subject: {..} } / { task: {..} }
//   [ .. ]
//   { ..entity.. }
//   null / empty body
//
// Everything collapses into `Normalized { data, pagination }`.

use serde::Serialize;
use serde_json::Value;

/// Keys under which single-entity responses wrap their payload.
const SINGLE_ENTITY_KEYS: [&str; 3] = ["user", "subject", "task"];

/// Normalized response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Single(Value),
    Many(Vec<Value>),
}

impl Payload {
    /// View the payload as rows: a single entity is a one-row slice.
    pub fn rows(&self) -> &[Value] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Many(rows) => rows,
        }
    }

    pub fn into_rows(self) -> Vec<Value> {
        match self {
            Self::Single(v) => vec![v],
            Self::Many(rows) => rows,
        }
    }
}

/// Paging metadata reported by the server for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized {
    pub data: Option<Payload>,
    pub pagination: Option<Pagination>,
}

/// Collapse any known envelope shape into [`Normalized`].
pub fn normalize(body: Value) -> Normalized {
    match body {
        Value::Null => Normalized::default(),
        Value::Array(rows) => Normalized {
            data: Some(Payload::Many(rows)),
            pagination: None,
        },
        Value::Object(mut map) => {
            if let Some(records) = map.remove("records") {
                let rows = match records {
                    Value::Array(rows) => rows,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                let pagination = pagination_from(&Value::Object(map), rows.len());
                return Normalized {
                    data: Some(Payload::Many(rows)),
                    pagination: Some(pagination),
                };
            }

            for key in SINGLE_ENTITY_KEYS {
                match map.get(key) {
                    Some(Value::Null) | None => {}
                    Some(_) => {
                        let entity = map.remove(key).unwrap_or(Value::Null);
                        return Normalized {
                            data: Some(Payload::Single(entity)),
                            pagination: None,
                        };
                    }
                }
            }

            Normalized {
                data: Some(Payload::Single(Value::Object(map))),
                pagination: None,
            }
        }
        scalar => Normalized {
            data: Some(Payload::Single(scalar)),
            pagination: None,
        },
    }
}

fn pagination_from(envelope: &Value, row_count: usize) -> Pagination {
    let rows = u64::try_from(row_count).unwrap_or(u64::MAX);

    let current_page = lenient_u64(envelope.get("current_page"))
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1);
    let page_size = lenient_u64(envelope.get("page_size"))
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n >= 1)
        .unwrap_or_else(|| u32::try_from(rows.max(1)).unwrap_or(u32::MAX));
    let total_count = lenient_u64(envelope.get("total_count")).unwrap_or(rows);
    let last_page = lenient_u64(envelope.get("last_page"))
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(|| {
            let pages = total_count.div_ceil(u64::from(page_size));
            u32::try_from(pages).unwrap_or(u32::MAX)
        })
        .max(1);

    Pagination {
        current_page,
        last_page,
        page_size,
        total_count,
    }
}

/// Accept JSON numbers or numeric strings (`"3"`, `" 3 "`).
fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .and_then(|f| format!("{:.0}", f.trunc()).parse().ok())
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

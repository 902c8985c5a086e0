// Filter, sort, and paging descriptors plus their server-side query encoding.
//
// Wire shape:
//   page=2&pageSize=10&sort=name,-created_at&filter[name][contains]=an

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ── Filter ──────────────────────────────────────────────────────────

/// How a filter value is compared against a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    Equals,
    StartsWith,
    #[default]
    Contains,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::StartsWith => "startsWith",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equals" | "eq" => Ok(Self::Equals),
            "startswith" | "starts_with" | "starts-with" => Ok(Self::StartsWith),
            "contains" => Ok(Self::Contains),
            other => Err(Error::InvalidInput(format!(
                "unknown filter relation '{other}' (expected equals, startsWith or contains)"
            ))),
        }
    }
}

/// A single column filter. An empty value is inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub column: String,
    pub value: String,
    #[serde(default)]
    pub relation: Relation,
}

impl FilterRule {
    pub fn new(column: impl Into<String>, relation: Relation, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            relation,
        }
    }

    /// Shorthand for the default `contains` relation.
    pub fn contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, Relation::Contains, value)
    }

    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }
}

// ── Sort ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascend" | "ascending" => Ok(Self::Asc),
            "desc" | "descend" | "descending" => Ok(Self::Desc),
            other => Err(Error::InvalidInput(format!(
                "unknown sort order '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// A single sort key. Position in the sorter list is the tie-break chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub column: String,
    pub order: SortOrder,
}

impl SortRule {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

// ── Query ───────────────────────────────────────────────────────────

/// Page descriptor sent as `page` / `pageSize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// Everything a list request can carry besides the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<PageRequest>,
    pub filters: Vec<FilterRule>,
    pub sorters: Vec<SortRule>,
}

impl ListQuery {
    pub fn paged(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(PageRequest { page, page_size }),
            ..Self::default()
        }
    }

    /// Encode as ordered `(key, value)` pairs for `RequestBuilder::query`.
    ///
    /// Inert filters are dropped. `sort` is omitted when there are no
    /// sorters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(page) = self.page {
            params.push(("page".to_owned(), page.page.to_string()));
            params.push(("pageSize".to_owned(), page.page_size.to_string()));
        }

        if !self.sorters.is_empty() {
            let sort = self
                .sorters
                .iter()
                .map(|s| match s.order {
                    SortOrder::Asc => s.column.clone(),
                    SortOrder::Desc => format!("-{}", s.column),
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("sort".to_owned(), sort));
        }

        for filter in self.filters.iter().filter(|f| f.is_active()) {
            params.push((
                format!("filter[{}][{}]", filter.column, filter.relation),
                filter.value.clone(),
            ));
        }

        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn params_carry_page_sort_and_active_filters() {
        let query = ListQuery {
            page: Some(PageRequest {
                page: 2,
                page_size: 10,
            }),
            filters: vec![
                FilterRule::contains("name", "an"),
                FilterRule::new("email", Relation::StartsWith, ""),
                FilterRule::new("role", Relation::Equals, "admin"),
            ],
            sorters: vec![SortRule::asc("name"), SortRule::desc("created_at")],
        };

        let params = query.to_params();
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("page", "2"),
                ("pageSize", "10"),
                ("sort", "name,-created_at"),
                ("filter[name][contains]", "an"),
                ("filter[role][equals]", "admin"),
            ]
        );
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(ListQuery::default().to_params().is_empty());
    }

    #[test]
    fn relation_parses_loosely() {
        assert_eq!("startsWith".parse::<Relation>().unwrap(), Relation::StartsWith);
        assert_eq!("starts_with".parse::<Relation>().unwrap(), Relation::StartsWith);
        assert_eq!("EQ".parse::<Relation>().unwrap(), Relation::Equals);
        assert!("like".parse::<Relation>().is_err());
    }

    #[test]
    fn sort_order_accepts_long_forms() {
        assert_eq!("descend".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    }
}

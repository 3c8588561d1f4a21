//! Collection queries: filter, sort and paginate.

use std::{cmp::Ordering, str::FromStr};

use bodykit_core::{Collection, Entry, content::ASSET_TYPE};

/// Type filter matching every content type.
pub const ANY_TYPE: &str = "any";

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort order `{other}`")),
        }
    }
}

/// Parameters of a collection search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Exact entry type, or [`ANY_TYPE`].
    pub type_filter: String,

    /// Field to sort by.
    pub sort: String,

    /// Sort direction.
    pub order: Order,

    /// Page size; `<= 0` disables pagination.
    pub limit: i64,

    /// 1-based page; `None` or `Some(0)` disables pagination.
    pub page: Option<usize>,

    /// Substring matched against body, title and tags.
    pub keywords: Option<String>,

    /// Include asset entries even when the type filter is not `asset`.
    pub include_assets: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            type_filter: ANY_TYPE.to_string(),
            sort: "timestamp".to_string(),
            order: Order::Desc,
            limit: DEFAULT_LIMIT,
            page: Some(1),
            keywords: None,
            include_assets: false,
        }
    }
}

impl Query {
    /// Query for entries of `type_filter` with default sorting and paging.
    pub fn of_type(type_filter: impl Into<String>) -> Self {
        Self {
            type_filter: type_filter.into(),
            ..Self::default()
        }
    }

    fn matches(&self, entry: &Entry) -> bool {
        if entry.is_asset() && !(self.include_assets || self.type_filter == ASSET_TYPE) {
            return false;
        }

        if self.type_filter != ANY_TYPE && entry.kind() != self.type_filter {
            return false;
        }

        match self.keywords.as_deref().filter(|k| !k.is_empty()) {
            Some(keywords) => matches_keywords(entry, keywords),
            None => true,
        }
    }

    fn page_bounds(&self, total: usize) -> Option<(usize, usize)> {
        let page = self.page.filter(|&p| p > 0)?;
        if self.limit <= 0 {
            return None;
        }
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let start = (page - 1).saturating_mul(limit).min(total);
        let end = page.saturating_mul(limit).min(total);
        Some((start, end))
    }
}

fn matches_keywords(entry: &Entry, keywords: &str) -> bool {
    match entry {
        Entry::Content(node) => {
            node.body.contains(keywords)
                || node.title.contains(keywords)
                || node.tags.iter().any(|tag| tag.contains(keywords))
        }
        Entry::Asset(asset) => asset.path.contains(keywords),
    }
}

/// Compare two field values.
///
/// Finite numbers compare by value and sort before every other value; the
/// rest compare lexicographically. Missing values compare as empty strings.
/// This is a total order, so any mix of values sorts safely.
pub fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn as_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Search a collection. Never mutates it; the sort is stable.
pub fn search<'c>(collection: &'c Collection, query: &Query) -> Vec<&'c Entry> {
    let mut results: Vec<&Entry> = collection.iter().filter(|e| query.matches(e)).collect();

    results.sort_by(|a, b| {
        let ordering = compare_values(
            a.field(&query.sort).as_deref(),
            b.field(&query.sort).as_deref(),
        );
        match query.order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    });

    match query.page_bounds(results.len()) {
        Some((start, end)) => results[start..end].to_vec(),
        None => results,
    }
}

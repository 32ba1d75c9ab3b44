//! Composable feed query builder
//!
//! The feed endpoints accept free-form query strings (text search, owner
//! filter, sort key/direction, page, page size). This module normalizes
//! them once into a [`FeedQuery`] and composes the stages — visibility,
//! filters, sort, pagination — into SQL through `sqlx::QueryBuilder`,
//! so every filtered listing shares one code path instead of per-endpoint
//! ad-hoc SQL.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Sort keys accepted by the video feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Views,
    Duration,
}

impl SortKey {
    /// Column name, whitelisted — never interpolate raw client input
    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "views" => Some(Self::Views),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Normalized feed query
///
/// Built from raw request parameters; junk values fall back to defaults
/// rather than erroring (page 1, size 10, newest-first).
#[derive(Debug, Clone)]
pub struct FeedQuery {
    /// Free-text filter over title and description
    pub text: Option<String>,
    /// Restrict to one owner/channel
    pub owner_id: Option<String>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub page: u32,
    pub per_page: u32,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            text: None,
            owner_id: None,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl FeedQuery {
    /// Normalize raw query-string parameters.
    ///
    /// Non-numeric or non-positive page/limit values fall back to the
    /// defaults; unknown sort keys fall back to `createdAt` descending.
    pub fn from_raw(
        text: Option<&str>,
        owner_id: Option<&str>,
        sort_by: Option<&str>,
        sort_type: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Self {
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned);
        let owner_id = owner_id
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(ToOwned::to_owned);

        let sort_key = sort_by.and_then(SortKey::parse).unwrap_or_default();
        let direction = match sort_type {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::default(),
        };

        Self {
            text,
            owner_id,
            sort_key,
            direction,
            page: parse_positive(page, DEFAULT_PAGE),
            per_page: parse_positive(limit, DEFAULT_PER_PAGE).min(MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Visibility stage: only published videos are ever considered.
    ///
    /// Must be pushed before any other filter so unpublished videos cannot
    /// leak through a text or owner match.
    pub fn push_visibility(qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE v.is_published = 1");
    }

    /// Filter stages: free-text and owner, each independently optional.
    pub fn push_filters<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        if let Some(text) = &self.text {
            let pattern = format!("%{}%", like_escape(text));
            qb.push(" AND (v.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR v.description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(owner_id) = &self.owner_id {
            qb.push(" AND v.owner_id = ").push_bind(owner_id.as_str());
        }
    }

    /// Sort stage. Applied after all filters.
    pub fn push_sort(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" ORDER BY ")
            .push(self.sort_key.column())
            .push(" ")
            .push(self.direction.sql());
    }

    /// Pagination stage. Applied after sort.
    pub fn push_pagination(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" LIMIT ")
            .push_bind(i64::from(self.per_page))
            .push(" OFFSET ")
            .push_bind(self.offset());
    }
}

/// One page of a listing, with totals computed from a matching count query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + i64::from(per_page) - 1) / i64::from(per_page)
        };
        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Escape LIKE wildcards in user-supplied text
fn like_escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

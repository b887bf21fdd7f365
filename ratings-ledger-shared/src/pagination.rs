//! Keyset (cursor) pagination shared by the feed, comment and activity lists.
//!
//! Every list is ordered by `(created_at DESC, id DESC)`. A cursor captures the
//! sort key of the last row served, and the next page is everything strictly
//! after it in that order:
//!
//! ```text
//! created_at < cursor.created_at OR (created_at = cursor.created_at AND id < cursor.id)
//! ```
//!
//! Pages are fetched with `limit + 1` rows; the extra lookahead row only signals
//! that another page exists and is never returned.
use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on any page size.
pub const MAX_PAGE_SIZE: usize = 100;

const SEPARATOR: char = '|';

/// Sort key of the last row of a served page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Encodes the cursor as `"<RFC 3339 timestamp>|<uuid>"`.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            SEPARATOR,
            self.id
        )
    }

    /// Decodes a token produced by [`Cursor::encode`].
    ///
    /// Returns `None` for anything malformed.
    pub fn decode(token: &str) -> Option<Self> {
        let (timestamp, id) = token.trim().split_once(SEPARATOR)?;
        let created_at = DateTime::parse_from_rfc3339(timestamp)
            .ok()?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).ok()?;
        Some(Self { created_at, id })
    }
}

/// Orders two sort keys newest first, breaking timestamp ties by id.
pub fn newest_first(
    left: (&DateTime<Utc>, &Uuid),
    right: (&DateTime<Utc>, &Uuid),
) -> Ordering {
    right.0.cmp(left.0).then_with(|| right.1.cmp(left.1))
}

/// Predicate selecting the rows of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFilter {
    /// No cursor: start from the newest row.
    FirstPage,
    /// Rows strictly older than the cursor in `(created_at DESC, id DESC)` order.
    After(Cursor),
}

impl PageFilter {
    /// Evaluates the filter against a row's sort key.
    pub fn admits(&self, created_at: &DateTime<Utc>, id: &Uuid) -> bool {
        match self {
            PageFilter::FirstPage => true,
            PageFilter::After(cursor) => {
                *created_at < cursor.created_at
                    || (*created_at == cursor.created_at && *id < cursor.id)
            }
        }
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            PageFilter::FirstPage => None,
            PageFilter::After(cursor) => Some(cursor),
        }
    }
}

/// A validated page request handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub filter: PageFilter,
}

impl PageRequest {
    /// Number of rows a repository must fetch: one more than the page size.
    pub fn fetch_limit(&self) -> usize {
        self.limit + 1
    }
}

/// One page of results plus the token for the next one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Turns client cursors into page filters and fetched rows into pages.
#[derive(Debug, Clone, Copy)]
pub struct CursorPaginator {
    default_limit: usize,
    max_limit: usize,
}

impl Default for CursorPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

impl CursorPaginator {
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    pub fn encode(&self, created_at: DateTime<Utc>, id: Uuid) -> String {
        Cursor::new(created_at, id).encode()
    }

    /// Decodes a client token. Malformed tokens mean "no cursor".
    pub fn decode(&self, token: &str) -> Option<Cursor> {
        Cursor::decode(token)
    }

    pub fn build_page_filter(&self, cursor: Option<&Cursor>) -> PageFilter {
        match cursor {
            Some(cursor) => PageFilter::After(*cursor),
            None => PageFilter::FirstPage,
        }
    }

    /// Builds a page request from raw client input.
    ///
    /// The limit is clamped to `1..=max_limit`; a missing or undecodable
    /// cursor yields the first page.
    pub fn request(&self, limit: Option<usize>, cursor: Option<&str>) -> PageRequest {
        let limit = limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit);
        let cursor = cursor.and_then(|token| self.decode(token));
        PageRequest {
            limit,
            filter: self.build_page_filter(cursor.as_ref()),
        }
    }

    /// Assembles a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// `key` extracts a row's `(created_at, id)` sort key. When the lookahead row is
    /// present the next cursor points at the last row actually returned.
    pub fn paginate<T>(
        &self,
        mut rows: Vec<T>,
        request: &PageRequest,
        key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
    ) -> Page<T> {
        if rows.len() <= request.limit {
            return Page {
                items: rows,
                next_cursor: None,
            };
        }

        rows.truncate(request.limit);
        let next_cursor = rows.last().map(|row| {
            let (created_at, id) = key(row);
            self.encode(created_at, id)
        });
        Page {
            items: rows,
            next_cursor,
        }
    }
}

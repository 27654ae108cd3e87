//! Cursor pagination over result sets keyed by a strictly increasing id.
//!
//! Every page is returned newest-first. A caller picks one of three cursors:
//!
//! - `before=X`: rows with id < X (walk towards older rows)
//! - `after=X`: rows with id > X, fetched ascending and re-ordered descending
//! - `offset=X`: skip X rows of the descending order (bounded, O(offset))
//!
//! With no cursor the most recent rows are returned. When more than one
//! cursor is supplied the precedence is before, then after, then offset.

use cosmex_types::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod request;

pub use request::*;

/// One page of rows plus whether more rows exist beyond it in the direction of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
        }
    }
}

/// A row set that can be windowed by its surrogate id.
///
/// Implementations must order by the id column itself, never by a
/// non-unique column alone.
pub trait CursorSource {
    type Item;

    fn row_id(item: &Self::Item) -> u64;

    /// Rows with id < `before`, descending, at most `limit`.
    fn fetch_before(&self, before: u64, limit: usize) -> anyhow::Result<Vec<Self::Item>>;

    /// Rows with id > `after`, ascending, at most `limit`.
    fn fetch_after(&self, after: u64, limit: usize) -> anyhow::Result<Vec<Self::Item>>;

    /// Rows in descending order, skipping `offset`, at most `limit`.
    fn fetch_offset(&self, offset: u64, limit: usize) -> anyhow::Result<Vec<Self::Item>>;
}

/// Fetch one page of `source` for an already-validated request.
pub fn paginate<S: CursorSource>(source: &S, request: &PageRequest) -> Result<Page<S::Item>> {
    let probe = request.limit.saturating_add(1);
    let mut rows = match request.cursor {
        Cursor::Latest => source.fetch_offset(0, probe),
        Cursor::Before(before) => source.fetch_before(before, probe),
        Cursor::After(after) => source.fetch_after(after, probe),
        Cursor::Offset(offset) => source.fetch_offset(offset, probe),
    }
    .map_err(ExplorerError::upstream)?;

    let has_more = rows.len() > request.limit;
    // For `after` the rows are ascending, so this keeps the ones nearest the cursor.
    rows.truncate(request.limit);
    rows.sort_by(|a, b| S::row_id(b).cmp(&S::row_id(a)));

    debug!(
        cursor = ?request.cursor,
        limit = request.limit,
        returned = rows.len(),
        has_more,
        "paginated result set"
    );

    Ok(Page {
        items: rows,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ids(Vec<u64>);

    impl CursorSource for Ids {
        type Item = u64;

        fn row_id(item: &u64) -> u64 {
            *item
        }

        fn fetch_before(&self, before: u64, limit: usize) -> anyhow::Result<Vec<u64>> {
            Ok(self.0.iter().rev().copied().filter(|id| *id < before).take(limit).collect())
        }

        fn fetch_after(&self, after: u64, limit: usize) -> anyhow::Result<Vec<u64>> {
            Ok(self.0.iter().copied().filter(|id| *id > after).take(limit).collect())
        }

        fn fetch_offset(&self, offset: u64, limit: usize) -> anyhow::Result<Vec<u64>> {
            Ok(self.0.iter().rev().copied().skip(offset as usize).take(limit).collect())
        }
    }

    struct Failing;

    impl CursorSource for Failing {
        type Item = u64;

        fn row_id(item: &u64) -> u64 {
            *item
        }

        fn fetch_before(&self, _: u64, _: usize) -> anyhow::Result<Vec<u64>> {
            anyhow::bail!("database connection reset")
        }

        fn fetch_after(&self, _: u64, _: usize) -> anyhow::Result<Vec<u64>> {
            anyhow::bail!("database connection reset")
        }

        fn fetch_offset(&self, _: u64, _: usize) -> anyhow::Result<Vec<u64>> {
            anyhow::bail!("database connection reset")
        }
    }

    fn request(cursor: Cursor, limit: usize) -> PageRequest {
        PageRequest { cursor, limit }
    }

    #[test]
    fn latest_returns_most_recent_rows_descending() {
        let source = Ids((1..=10).collect());
        let page = paginate(&source, &request(Cursor::Latest, 3)).unwrap();
        assert_eq!(page.items, vec![10, 9, 8]);
        assert!(page.has_more);
    }

    #[test]
    fn before_walks_towards_older_rows() {
        let source = Ids((1..=10).collect());
        let page = paginate(&source, &request(Cursor::Before(4), 5)).unwrap();
        assert_eq!(page.items, vec![3, 2, 1]);
        assert!(!page.has_more);
    }

    #[test]
    fn after_returns_nearest_rows_in_descending_order() {
        let source = Ids((1..=10).collect());
        let page = paginate(&source, &request(Cursor::After(3), 3)).unwrap();
        assert_eq!(page.items, vec![6, 5, 4]);
        assert!(page.has_more);

        let last = paginate(&source, &request(Cursor::After(8), 3)).unwrap();
        assert_eq!(last.items, vec![10, 9]);
        assert!(!last.has_more);
    }

    #[test]
    fn offset_skips_descending_rows() {
        let source = Ids((1..=10).collect());
        let page = paginate(&source, &request(Cursor::Offset(2), 3)).unwrap();
        assert_eq!(page.items, vec![8, 7, 6]);
        assert!(page.has_more);
    }

    #[test]
    fn source_failure_is_upstream_unavailable() {
        let err = paginate(&Failing, &request(Cursor::Latest, 3)).unwrap_err();
        assert!(matches!(err, ExplorerError::UpstreamUnavailable(_)));
    }

    #[test]
    fn page_serializes_with_has_more_key() {
        let page = Page {
            items: vec![1u64, 2],
            has_more: true,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["hasMore"], serde_json::json!(true));
        assert_eq!(json["items"], serde_json::json!([1, 2]));
    }
}

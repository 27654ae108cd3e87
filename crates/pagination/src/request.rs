use cosmex_types::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw pagination parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub before: Option<u64>,
    #[serde(default)]
    pub after: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// The single cursor honored for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Latest,
    Before(u64),
    After(u64),
    Offset(u64),
}

/// A validated pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Cursor,
    pub limit: usize,
}

/// Per-endpoint bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Largest accepted `offset`; offset paging costs O(offset).
    pub max_offset: u64,
}

impl PageLimits {
    pub const fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
            max_offset: 10_000,
        }
    }

    pub fn with_max_offset(mut self, max_offset: u64) -> Self {
        self.max_offset = max_offset;
        self
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::new(20, 100)
    }
}

impl PageQuery {
    pub fn before(before: u64) -> Self {
        Self {
            before: Some(before),
            ..Self::default()
        }
    }

    pub fn after(after: u64) -> Self {
        Self {
            after: Some(after),
            ..Self::default()
        }
    }

    pub fn offset(offset: u64) -> Self {
        Self {
            offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate against `limits` and pick the cursor to honor.
    ///
    /// Limits above the maximum are rejected, never clamped.
    pub fn into_request(self, limits: &PageLimits) -> Result<PageRequest> {
        let limit = match self.limit {
            Some(0) => return Err(ExplorerError::invalid_input("limit must be at least 1")),
            Some(limit) if limit > limits.max_limit => {
                return Err(ExplorerError::invalid_input(format!(
                    "limit {limit} exceeds maximum {}",
                    limits.max_limit
                )))
            }
            Some(limit) => limit,
            None => limits.default_limit.min(limits.max_limit),
        };

        let supplied = [self.before, self.after, self.offset]
            .iter()
            .filter(|value| value.is_some())
            .count();
        if supplied > 1 {
            debug!(
                before = ?self.before,
                after = ?self.after,
                offset = ?self.offset,
                "multiple cursors supplied; honoring by precedence before > after > offset"
            );
        }

        let cursor = match (self.before, self.after, self.offset) {
            (Some(before), _, _) => Cursor::Before(before),
            (None, Some(after), _) => Cursor::After(after),
            (None, None, Some(offset)) if offset > limits.max_offset => {
                return Err(ExplorerError::invalid_input(format!(
                    "offset {offset} exceeds maximum {}; use before/after cursors for deep pagination",
                    limits.max_offset
                )))
            }
            (None, None, Some(0)) => Cursor::Latest,
            (None, None, Some(offset)) => Cursor::Offset(offset),
            (None, None, None) => Cursor::Latest,
        };

        Ok(PageRequest { cursor, limit })
    }
}

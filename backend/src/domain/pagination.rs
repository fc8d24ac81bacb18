//! Offset pagination window shared by list operations.

use serde::{Deserialize, Serialize};

/// Default number of rows returned when `take` is omitted.
pub const DEFAULT_TAKE: u32 = 10;
/// Upper bound applied to `take`.
pub const MAX_TAKE: u32 = 100;

/// Offset window over an ordered result set.
///
/// # Examples
/// ```
/// use academy_backend::domain::PageRequest;
///
/// let page = PageRequest::new(Some(20), Some(500));
/// assert_eq!(page.skip(), 20);
/// assert_eq!(page.take(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    skip: u32,
    take: u32,
}

impl PageRequest {
    /// Build a window, defaulting `skip` to 0 and `take` to 10, capping
    /// `take` at [`MAX_TAKE`].
    pub fn new(skip: Option<u32>, take: Option<u32>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            take: take.unwrap_or(DEFAULT_TAKE).min(MAX_TAKE),
        }
    }

    /// Rows to skip.
    pub fn skip(self) -> u32 {
        self.skip
    }

    /// Rows to return.
    pub fn take(self) -> u32 {
        self.take
    }

    /// Apply the window to an already ordered iterator.
    pub fn apply<T>(self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.take as usize)
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

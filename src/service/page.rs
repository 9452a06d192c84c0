//! Page-number pagination

use serde::Serialize;

use crate::error::AppError;

/// Page `number` (1-based) of `size` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    /// # Errors
    /// `InvalidPayload` when `number` is 0
    pub fn new(number: u32, size: u32) -> Result<Self, AppError> {
        if number == 0 {
            return Err(AppError::InvalidPayload(
                "page must be greater than or equal to 1".to_string(),
            ));
        }
        Ok(Self { number, size })
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

/// One page of results plus the total number of matching items
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
        }
    }
}

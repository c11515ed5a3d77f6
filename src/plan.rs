//! Pagination of a layer list into fixed-size batches.
//!
//! Positions are 1-based and inclusive on both ends: batch `i` covers
//! `[(i - 1) * size + 1, min(i * size, total)]`.

use serde::Serialize;
use std::ops::RangeInclusive;

use crate::error::{CoverageError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// 1-based batch number.
    pub index: usize,
    /// First item position (1-based, inclusive).
    pub start: usize,
    /// Last item position (1-based, inclusive).
    pub end: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn positions(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// The items of `items` this batch covers, or `None` if it runs past the end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> Option<&'a [T]> {
        let from = self.start.checked_sub(1)?;
        items.get(from..self.end)
    }

    /// Comma-separated item positions, e.g. `4, 5, 6`.
    pub fn describe(&self) -> String {
        self.positions()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Converts a user-supplied batch size, rejecting anything below 1.
pub fn checked_size(raw: i64) -> Result<usize> {
    match usize::try_from(raw) {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(CoverageError::InvalidBatchSize(raw)),
    }
}

/// `ceil(total / size)`.
pub fn batch_count(total: usize, size: usize) -> Result<usize> {
    if size == 0 {
        return Err(CoverageError::InvalidBatchSize(0));
    }
    Ok(total.div_ceil(size))
}

/// The range of batch `index` (1-based) over `total` items.
pub fn range_for(index: usize, total: usize, size: usize) -> Result<Batch> {
    let count = batch_count(total, size)?;
    if index == 0 || index > count {
        return Err(CoverageError::InvalidBatchNumber { index, count });
    }

    let start = (index - 1) * size + 1;
    let end = (index * size).min(total);
    Ok(Batch { index, start, end })
}

/// Every batch over `total` items; empty when `total` is 0.
pub fn plan(total: usize, size: usize) -> Result<Vec<Batch>> {
    let count = batch_count(total, size)?;
    (1..=count).map(|i| range_for(i, total, size)).collect()
}

//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Membership Matrix
//!
//! Boolean (examples × slices) matrix: row `i`, column `j` is true iff example
//! `i` belongs to slice `j`. Matrices are built per batch and concatenated
//! along the example axis; the column count never changes.

use serde::{Deserialize, Serialize};

use crate::dataset::ZiDataset;
use crate::errors::{Result, ZiError};

/// Row-major boolean membership matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ZiMembershipParts")]
pub struct ZiMembershipMatrix {
    rows: usize,
    cols: usize,
    data: Vec<bool>,
}

/// Serialized layout, checked before it becomes a matrix.
#[derive(Deserialize)]
struct ZiMembershipParts {
    rows: usize,
    cols: usize,
    data: Vec<bool>,
}

impl TryFrom<ZiMembershipParts> for ZiMembershipMatrix {
    type Error = ZiError;

    fn try_from(parts: ZiMembershipParts) -> Result<Self> {
        let expected = parts.rows.checked_mul(parts.cols).ok_or_else(|| {
            ZiError::schema(format!(
                "membership shape ({}, {}) overflows",
                parts.rows, parts.cols
            ))
        })?;
        if parts.data.len() != expected {
            return Err(ZiError::schema(format!(
                "membership of shape ({}, {}) needs {expected} cells, found {}",
                parts.rows,
                parts.cols,
                parts.data.len()
            )));
        }
        Ok(Self {
            rows: parts.rows,
            cols: parts.cols,
            data: parts.data,
        })
    }
}

impl ZiMembershipMatrix {
    /// All-false matrix of the given shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![false; rows * cols],
        }
    }

    /// Matrix with every example in every slice.
    pub fn filled(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![true; rows * cols],
        }
    }

    /// Builds a matrix from rows; every row must have `cols` entries.
    pub fn from_rows(rows: Vec<Vec<bool>>, cols: usize) -> Result<Self> {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ZiError::schema(format!(
                    "membership row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
        }
    }

    /// Slice memberships of example `row`; `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[bool]> {
        (row < self.rows).then(|| self.row_cells(row))
    }

    /// Membership of every example in slice `col`; `None` past the last column.
    pub fn column(&self, col: usize) -> Option<impl Iterator<Item = bool> + '_> {
        (col < self.cols).then(|| self.column_cells(col))
    }

    /// Number of examples in each slice.
    pub fn column_counts(&self) -> Vec<usize> {
        (0..self.cols)
            .map(|col| self.column_cells(col).filter(|member| *member).count())
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.rows).map(|row| self.row_cells(row).to_vec()).collect()
    }

    fn row_cells(&self, row: usize) -> &[bool] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    fn column_cells(&self, col: usize) -> impl Iterator<Item = bool> + '_ {
        (0..self.rows).map(move |row| self.data[row * self.cols + col])
    }

    /// Stacks matrices along the example axis. All parts must share `cols`.
    pub fn concat(parts: &[ZiMembershipMatrix], cols: usize) -> Result<Self> {
        let rows = parts.iter().map(|part| part.rows).sum();
        let mut data = Vec::with_capacity(rows * cols);
        for (i, part) in parts.iter().enumerate() {
            if part.cols != cols {
                return Err(ZiError::schema(format!(
                    "membership block {i} has {} columns, expected {cols}",
                    part.cols
                )));
            }
            data.extend_from_slice(&part.data);
        }
        Ok(Self { rows, cols, data })
    }
}

/// Selects the rows of `batch` belonging to each slice.
///
/// Element `j` of the result holds exactly the rows where column `j` of
/// `membership` is true, in their original relative order.
pub fn filter_batch_by_slice_membership(
    batch: &ZiDataset,
    membership: &ZiMembershipMatrix,
) -> Result<Vec<ZiDataset>> {
    if membership.rows() != batch.len() {
        return Err(ZiError::schema(format!(
            "membership matrix has {} rows but batch has {} examples",
            membership.rows(),
            batch.len()
        )));
    }
    (0..membership.cols())
        .map(|col| batch.filter_mask(membership.column_cells(col)))
        .collect()
}

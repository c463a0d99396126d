use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Rectangular on/off cell matrix.
///
/// Row 0 is the lowest pitch, columns are time steps. The shape is fixed
/// once created; edits never change it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// cells[row * cols + col]
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Build a grid from rows of cells. Returns None for ragged input.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.dimensions() == other.dimensions()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(GridError::OutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Out-of-range cells read as off
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col).map(|i| self.cells[i]).unwrap_or(false)
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<(), GridError> {
        let i = self.index(row, col)?;
        self.cells[i] = value;
        Ok(())
    }

    /// Flip one cell and return its new state
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool, GridError> {
        let i = self.index(row, col)?;
        self.cells[i] = !self.cells[i];
        Ok(self.cells[i])
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Rows with an active cell in the given column, lowest first
    pub fn active_rows(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows).filter(move |&row| self.get(row, col))
    }

    /// Cells in row-major order (row 0 first, column 0 first within a row)
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[bool] {
        if row < self.rows {
            &self.cells[row * self.cols..(row + 1) * self.cols]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_and_reports() {
        let mut grid = Grid::new(2, 8);
        assert!(grid.toggle(1, 3).unwrap());
        assert!(grid.get(1, 3));
        assert!(!grid.toggle(1, 3).unwrap());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_out_of_range_rejected_without_change() {
        let mut grid = Grid::new(1, 8);
        let err = grid.toggle(1, 0).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfRange {
                row: 1,
                col: 0,
                rows: 1,
                cols: 8
            }
        );
        assert!(grid.set(0, 8, true).is_err());
        assert!(grid.is_empty());
        assert!(!grid.get(5, 5));
    }

    #[test]
    fn test_active_rows_and_clear() {
        let mut grid = Grid::new(16, 16);
        grid.set(0, 4, true).unwrap();
        grid.set(9, 4, true).unwrap();
        grid.set(9, 5, true).unwrap();
        assert_eq!(grid.active_rows(4).collect::<Vec<_>>(), vec![0, 9]);
        assert_eq!(grid.active_count(), 3);

        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.dimensions(), (16, 16));
    }

    #[test]
    fn test_from_rows() {
        let grid = Grid::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(grid.dimensions(), (2, 2));
        assert!(grid.get(1, 1));
        assert_eq!(grid.row(0), &[true, false]);
        assert!(Grid::from_rows(&[vec![true], vec![false, true]]).is_none());
    }
}

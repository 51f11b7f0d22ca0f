//! The table storage contract.
//!
//! Grids are owned by the caller (a wiki page renderer, a test harness); the
//! core only reads cells, writes judgments back into them, and appends child
//! tables. Cell text comes in two flavors because pages store markup:
//! escaped (as stored) and unescaped (as authored).

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::results::CellResult;

/// Storage for one table: rows of variable-width columns.
pub trait Grid {
    fn cell_text(&self, col: usize, row: usize) -> String;
    fn unescaped_cell_text(&self, col: usize, row: usize) -> String;
    fn column_count(&self, row: usize) -> usize;
    fn row_count(&self) -> usize;
    fn set_cell(&mut self, col: usize, row: usize, result: &CellResult);
    fn set_name(&mut self, name: &str);
    fn append_child_table(&mut self, at_row: usize, child: SharedGrid);
}

/// Ergonomic wrapper for the shared, mutable grid handle. Every table node
/// and every pending expectation anchored to a table holds one of these.
#[derive(Clone)]
pub struct SharedGrid(pub Rc<RefCell<dyn Grid>>);

impl SharedGrid {
    /// Create a new SharedGrid from any Grid.
    pub fn new<G: Grid + 'static>(grid: G) -> Self {
        SharedGrid(Rc::new(RefCell::new(grid)))
    }

    pub fn cell_text(&self, col: usize, row: usize) -> String {
        self.0.borrow().cell_text(col, row)
    }

    pub fn unescaped_cell_text(&self, col: usize, row: usize) -> String {
        self.0.borrow().unescaped_cell_text(col, row)
    }

    pub fn column_count(&self, row: usize) -> usize {
        self.0.borrow().column_count(row)
    }

    pub fn row_count(&self) -> usize {
        self.0.borrow().row_count()
    }

    pub fn set_cell(&self, col: usize, row: usize, result: &CellResult) {
        self.0.borrow_mut().set_cell(col, row, result);
    }

    pub fn set_name(&self, name: &str) {
        self.0.borrow_mut().set_name(name);
    }

    pub fn append_child_table(&self, at_row: usize, child: SharedGrid) {
        self.0.borrow_mut().append_child_table(at_row, child);
    }

    /// Reads the whole table back as rows of unescaped cell text.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let grid = self.0.borrow();
        (0..grid.row_count())
            .map(|row| {
                (0..grid.column_count(row))
                    .map(|col| grid.unescaped_cell_text(col, row))
                    .collect()
            })
            .collect()
    }

    /// Borrow the grid mutably (for advanced use).
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Grid> {
        self.0.borrow_mut()
    }
}

impl fmt::Debug for SharedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0.borrow();
        write!(f, "SharedGrid({} rows)", grid.row_count())
    }
}

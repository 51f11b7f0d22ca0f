#![allow(dead_code)]

//! # Trestle Test Harness
//!
//! Shared fixtures for the integration suite: an in-memory grid, scripted
//! and failing transports, and two small table variants exercising the
//! builder contract from both the happy and the malformed side.

use std::ops::Range;

use trestle::errors::transport_error;
use trestle::escape::unescape;
use trestle::expectations::ExpectationKind;
use trestle::instructions::InstructionArg;
use trestle::tables::{TableScope, TableVariant};
use trestle::{
    CellResult, ErrorReporting, Grid, Instruction, InstructionResults, InstructionTransport,
    SharedGrid, TrestleError,
};

// ---
// Grids
// ---

/// In-memory grid backed by row vectors. Judgments overwrite the cell text
/// with their rendered form, which is what assertions read back.
pub struct TextGrid {
    cells: Vec<Vec<String>>,
    name: String,
    children: Vec<SharedGrid>,
}

impl TextGrid {
    pub fn new(rows: &[&[&str]]) -> Self {
        TextGrid {
            cells: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_owned()).collect())
                .collect(),
            name: String::new(),
            children: Vec::new(),
        }
    }
}

impl Grid for TextGrid {
    fn cell_text(&self, col: usize, row: usize) -> String {
        self.cells[row][col].clone()
    }

    fn unescaped_cell_text(&self, col: usize, row: usize) -> String {
        unescape(&self.cells[row][col])
    }

    fn column_count(&self, row: usize) -> usize {
        self.cells[row].len()
    }

    fn row_count(&self) -> usize {
        self.cells.len()
    }

    fn set_cell(&mut self, col: usize, row: usize, result: &CellResult) {
        self.cells[row][col] = result.to_string();
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn append_child_table(&mut self, _at_row: usize, child: SharedGrid) {
        self.children.push(child);
    }
}

pub fn grid(rows: &[&[&str]]) -> SharedGrid {
    SharedGrid::new(TextGrid::new(rows))
}

// ---
// Transports
// ---

/// Replays a canned tag→result map, recording the serialized form of every
/// instruction it was sent.
pub struct ScriptedTransport {
    results: InstructionResults,
    pub sent: Vec<serde_json::Value>,
}

impl ScriptedTransport {
    pub fn new(replies: &[(&str, &str)]) -> Self {
        ScriptedTransport {
            results: replies
                .iter()
                .map(|(tag, value)| ((*tag).to_owned(), (*value).to_owned()))
                .collect(),
            sent: Vec::new(),
        }
    }

    /// Tags of the instructions sent, in transmission order.
    pub fn sent_tags(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|instruction| instruction[0].as_str().unwrap_or_default().to_owned())
            .collect()
    }
}

impl InstructionTransport for ScriptedTransport {
    fn execute(
        &mut self,
        instructions: &[Instruction],
    ) -> Result<InstructionResults, TrestleError> {
        for instruction in instructions {
            self.sent
                .push(serde_json::to_value(instruction).expect("instruction serializes"));
        }
        Ok(self.results.clone())
    }
}

/// Fails every execution, standing in for a dead runner connection.
pub struct FailingTransport {
    pub message: String,
}

impl InstructionTransport for FailingTransport {
    fn execute(
        &mut self,
        _instructions: &[Instruction],
    ) -> Result<InstructionResults, TrestleError> {
        Err(transport_error(self.message.as_str()))
    }
}

// ---
// Table variants
// ---

/// A minimal script-style row grammar.
///
/// Row 0 is the fixture header: `| fixture name | ctor arg | ... |`. Body
/// rows come in three shapes:
/// `| $sym= | method | arg... |` captures the result into a symbol,
/// `| check | method | arg... | expected |` asserts the last cell (swap
/// `check` for `reject` to assert a non-match), and anything else is a
/// plain action row `| method | arg... |`, judged silently.
pub struct ScriptVariant;

impl TableVariant for ScriptVariant {
    fn table_type(&self) -> &str {
        "scriptTable"
    }

    fn compile(&self, scope: &mut TableScope<'_>) -> Result<(), TrestleError> {
        let instance = scope.name().to_owned();
        scope.construct_fixture()?;
        let grid = scope.grid();
        for row in 1..grid.row_count() {
            let columns = grid.column_count(row);
            if columns == 0 {
                continue;
            }
            let head = grid.cell_text(0, row);
            if let Some(symbol) = scope.symbol_assignment_at(0, row) {
                if columns < 2 {
                    return Err(
                        scope.syntax_error("capture row needs a method", scope.row_span(row))
                    );
                }
                let method = grid.cell_text(1, row);
                let args = arg_cells(&grid, 2..columns, row);
                let tag = scope.call_and_assign(&symbol, &instance, &method, args);
                scope.expect(tag, 0, row, ExpectationKind::SymbolAssignment { symbol });
            } else if head == "check" || head == "reject" {
                if columns < 3 {
                    return Err(scope.syntax_error(
                        "check row needs a method and an expected cell",
                        scope.row_span(row),
                    ));
                }
                let method = grid.cell_text(1, row);
                let args = arg_cells(&grid, 2..columns - 1, row);
                let tag = scope.call_function(&instance, &method, args);
                let kind = if head == "check" {
                    ExpectationKind::ReturnedValue
                } else {
                    ExpectationKind::RejectedValue
                };
                scope.expect(tag, columns - 1, row, kind);
            } else {
                let args = arg_cells(&grid, 1..columns, row);
                let tag = scope.call_function(&instance, &head, args);
                scope.expect(tag, 0, row, ExpectationKind::Silent);
            }
        }
        Ok(())
    }
}

/// Rejects any body row whose width differs from the header's. Exists to
/// exercise the localized syntax-error path with a realistic variant.
pub struct StrictVariant;

impl TableVariant for StrictVariant {
    fn table_type(&self) -> &str {
        "strictTable"
    }

    fn compile(&self, scope: &mut TableScope<'_>) -> Result<(), TrestleError> {
        scope.construct_fixture()?;
        let grid = scope.grid();
        let width = grid.column_count(0);
        for row in 1..grid.row_count() {
            let found = grid.column_count(row);
            if found != width {
                return Err(scope.syntax_error(
                    &format!("row {} has {} cells, expected {}", row, found, width),
                    scope.row_span(row),
                ));
            }
        }
        Ok(())
    }
}

fn arg_cells(grid: &SharedGrid, cols: Range<usize>, row: usize) -> Vec<InstructionArg> {
    cols.map(|col| InstructionArg::Text(grid.unescaped_cell_text(col, row)))
        .collect()
}

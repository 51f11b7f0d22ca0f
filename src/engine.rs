//! The page engine: compile, execute, apply.
//!
//! A [`TestPage`] gathers root tables, compiles them depth-first into one
//! ordered instruction list, ships that list through an
//! [`InstructionTransport`], and feeds the returned values back through
//! the pending expectations. One page is one run: symbols, scenario
//! registrations, and counters accumulate across every table on it.

use crate::context::TestRunContext;
use crate::errors::TrestleError;
use crate::grid::SharedGrid;
use crate::instructions::{Instruction, InstructionResults, InstructionTransport};
use crate::results::{CellResult, TestSummary};
use crate::tables::{TableArena, TableId, TableScope, TableVariant};

struct Root {
    table: TableId,
    variant: Box<dyn TableVariant>,
}

/// A page of top-level tables sharing one run context.
#[derive(Default)]
pub struct TestPage {
    arena: TableArena,
    context: TestRunContext,
    roots: Vec<Root>,
    next_root: usize,
}

impl TestPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root table to the page. Root ids are assigned in page order
    /// (`"0"`, `"1"`, ...) and never repeat within a page, even across
    /// separate compiles; the table's name is its variant's type qualified
    /// by that id.
    pub fn add_table<V: TableVariant + 'static>(
        &mut self,
        variant: V,
        grid: SharedGrid,
    ) -> TableId {
        let id = self.next_root.to_string();
        self.next_root += 1;
        let name = format!("{}_{}", variant.table_type(), id);
        let table = self.arena.insert(id, name, None, grid);
        self.roots.push(Root {
            table,
            variant: Box::new(variant),
        });
        table
    }

    /// Compiles every root added since the last compile, in page order,
    /// returning the combined instruction list.
    ///
    /// A syntax error does not abort the page: the offending table gets an
    /// Error judgment in its header cell and one errored count, its
    /// instructions and expectations are discarded, and compilation moves
    /// on to the next root. A table with no header cell is counted without
    /// the cell write. Internal errors do propagate.
    pub fn compile(&mut self) -> Result<Vec<Instruction>, TrestleError> {
        let mut compiled = Vec::new();
        for root in std::mem::take(&mut self.roots) {
            let mut instructions = Vec::new();
            let mut expectations = Vec::new();
            let mut scope = TableScope::new(
                &mut self.arena,
                root.table,
                &mut self.context,
                &mut instructions,
                &mut expectations,
            );
            match root.variant.compile(&mut scope) {
                Ok(()) => {
                    compiled.append(&mut instructions);
                    self.context.expectations.append(&mut expectations);
                }
                Err(error) if error.is_syntax() => {
                    let grid = self.arena.node(root.table).grid.clone();
                    if grid.row_count() > 0 && grid.column_count(0) > 0 {
                        grid.set_cell(0, 0, &CellResult::Error(error.to_string()));
                    }
                    self.context.summary.exceptions += 1;
                }
                Err(error) => return Err(error),
            }
        }
        Ok(compiled)
    }

    /// Feeds returned values to the pending expectations, writing rendered
    /// results into the grids.
    pub fn apply_results(&mut self, results: &InstructionResults) {
        self.context.apply_results(results);
    }

    /// The whole pipeline: compile the page, execute it over `transport`,
    /// apply the results, and report the final counters. A transport
    /// failure aborts the run and leaves the pending expectations queued.
    pub fn run(
        &mut self,
        transport: &mut dyn InstructionTransport,
    ) -> Result<TestSummary, TrestleError> {
        let instructions = self.compile()?;
        let results = transport.execute(&instructions)?;
        self.context.apply_results(&results);
        Ok(self.context.summary)
    }

    pub fn context(&self) -> &TestRunContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TestRunContext {
        &mut self.context
    }

    pub fn arena(&self) -> &TableArena {
        &self.arena
    }

    pub fn summary(&self) -> TestSummary {
        self.context.summary
    }
}

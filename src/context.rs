//! Run-wide shared state.

use im::HashMap;

use crate::expectations::{EvalContext, Expectation};
use crate::instructions::InstructionResults;
use crate::results::TestSummary;
use crate::symbols::SymbolTable;
use crate::tables::TableId;

/// State shared by every table and every expectation in one test run.
///
/// One context lives exactly as long as one run, which may span many
/// top-level tables; symbols and scenario registrations made by an early
/// table are visible to every later one.
#[derive(Debug, Default)]
pub struct TestRunContext {
    pub symbols: SymbolTable,
    pub scenarios: HashMap<String, TableId>,
    pub expectations: Vec<Expectation>,
    pub summary: TestSummary,
}

impl TestRunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an expectation for the next batch of results. Registration
    /// order is evaluation order.
    pub fn expect(&mut self, expectation: Expectation) {
        self.expectations.push(expectation);
    }

    /// Records `table` as the definition of the named scenario, replacing
    /// any earlier definition.
    pub fn register_scenario(&mut self, name: impl Into<String>, table: TableId) {
        self.scenarios.insert(name.into(), table);
    }

    pub fn scenario(&self, name: &str) -> Option<TableId> {
        self.scenarios.get(name).copied()
    }

    /// Feeds returned values to every pending expectation, in registration
    /// order, consuming the pending list. Tags absent from `results` render
    /// as not run.
    pub fn apply_results(&mut self, results: &InstructionResults) {
        let pending = std::mem::take(&mut self.expectations);
        for expectation in &pending {
            let mut ctx = EvalContext {
                symbols: &mut self.symbols,
                summary: &mut self.summary,
            };
            expectation.evaluate(results.get(&expectation.tag), &mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::ExpectationKind;
    use crate::grid::{Grid, SharedGrid};
    use crate::results::CellResult;

    struct RowGrid {
        cells: Vec<String>,
    }

    impl Grid for RowGrid {
        fn cell_text(&self, col: usize, _row: usize) -> String {
            self.cells[col].clone()
        }

        fn unescaped_cell_text(&self, col: usize, row: usize) -> String {
            self.cell_text(col, row)
        }

        fn column_count(&self, _row: usize) -> usize {
            self.cells.len()
        }

        fn row_count(&self) -> usize {
            1
        }

        fn set_cell(&mut self, col: usize, _row: usize, result: &CellResult) {
            self.cells[col] = result.to_string();
        }

        fn set_name(&mut self, _name: &str) {}

        fn append_child_table(&mut self, _at_row: usize, _child: SharedGrid) {}
    }

    #[test]
    fn test_scenario_registry_keeps_latest_definition() {
        let mut context = TestRunContext::new();
        context.register_scenario("login", TableId(0));
        context.register_scenario("login", TableId(2));
        assert_eq!(context.scenario("login"), Some(TableId(2)));
        assert_eq!(context.scenario("logout"), None);
    }

    #[test]
    fn test_apply_results_runs_in_registration_order_and_consumes() {
        let grid = SharedGrid::new(RowGrid {
            cells: vec!["$V=".to_owned(), "$V".to_owned()],
        });
        let mut context = TestRunContext::new();
        context.expect(Expectation::new(
            "t_0",
            0,
            0,
            grid.clone(),
            ExpectationKind::SymbolAssignment {
                symbol: "V".into(),
            },
        ));
        context.expect(Expectation::new(
            "t_1",
            1,
            0,
            grid.clone(),
            ExpectationKind::ReturnedValue,
        ));

        let mut results = InstructionResults::new();
        results.insert("t_0", "10");
        results.insert("t_1", "10");
        context.apply_results(&results);

        // The assignment ran first, so the second cell resolved its symbol.
        assert_eq!(grid.cell_text(0, 0), "$V<-[10]");
        assert_eq!(grid.cell_text(1, 0), "pass($V->[10])");
        assert_eq!(context.summary.right, 1);
        assert!(context.expectations.is_empty());
    }
}

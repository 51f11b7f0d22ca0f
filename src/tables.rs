//! The table tree and its instruction builder.
//!
//! A page of tables compiles into a tree of [`TableNode`]s held in a
//! [`TableArena`], depth-first and left-to-right. Each compiling table
//! works through a [`TableScope`]: it mints tags, emits instructions,
//! anchors expectations to its cells, and attaches child tables, all
//! against the shared run context. Concrete row grammars plug in through
//! [`TableVariant`].

use miette::SourceSpan;

use crate::context::TestRunContext;
use crate::errors::{
    DiagnosticInfo, ErrorKind, ErrorReporting, SourceInfo, TableSource, TrestleError,
};
use crate::expectations::{Expectation, ExpectationKind};
use crate::grid::SharedGrid;
use crate::instructions::{Instruction, InstructionArg, Operation};
use crate::normalize::{disgrace_class_name, disgrace_method_name};
use crate::symbols::symbol_assignment;

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Handle to one node in a run's [`TableArena`]. Minted only by
/// [`TableArena::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableId(pub(crate) usize);

/// One node in the tree mirroring the grid's table-of-tables structure.
#[derive(Debug)]
pub struct TableNode {
    /// Dotted path unique among siblings and stable once assigned,
    /// e.g. `"0"` or `"0.1"`.
    pub id: String,
    /// Tag prefix, qualified by the parent chain for child tables,
    /// e.g. `"decisionTable_0"` or `"scriptTable_0_2/decisionTable_0.0"`.
    pub name: String,
    next_seq: usize,
    pub children: Vec<TableId>,
    pub parent: Option<TableId>,
    pub grid: SharedGrid,
}

/// Owns every [`TableNode`] of a run. Parent links are arena ids rather
/// than references, so the tree carries no ownership cycles.
#[derive(Debug, Default)]
pub struct TableArena {
    nodes: Vec<TableNode>,
}

impl TableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        id: String,
        name: String,
        parent: Option<TableId>,
        grid: SharedGrid,
    ) -> TableId {
        let table = TableId(self.nodes.len());
        self.nodes.push(TableNode {
            id,
            name,
            next_seq: 0,
            children: Vec::new(),
            parent,
            grid,
        });
        table
    }

    pub fn node(&self, table: TableId) -> &TableNode {
        &self.nodes[table.0]
    }

    pub fn node_mut(&mut self, table: TableId) -> &mut TableNode {
        &mut self.nodes[table.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// One concrete table grammar: a decision table, a script table, and so on.
///
/// A variant compiles its grid into instructions and expectations through
/// the [`TableScope`] it is handed. A malformed row shape is reported as a
/// syntax error, which the engine localizes to the offending table instead
/// of aborting the run.
pub trait TableVariant {
    /// Tag prefix for tables of this variant, e.g. `"decisionTable"`.
    fn table_type(&self) -> &str;

    /// Compiles the table's rows.
    fn compile(&self, scope: &mut TableScope<'_>) -> Result<(), TrestleError>;
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A compiling table's view of the run: its node in the arena, the shared
/// context, and the buffers instructions and expectations accumulate into
/// until the whole root table has compiled cleanly.
pub struct TableScope<'a> {
    arena: &'a mut TableArena,
    table: TableId,
    context: &'a mut TestRunContext,
    instructions: &'a mut Vec<Instruction>,
    expectations: &'a mut Vec<Expectation>,
}

impl<'a> TableScope<'a> {
    pub fn new(
        arena: &'a mut TableArena,
        table: TableId,
        context: &'a mut TestRunContext,
        instructions: &'a mut Vec<Instruction>,
        expectations: &'a mut Vec<Expectation>,
    ) -> Self {
        Self {
            arena,
            table,
            context,
            instructions,
            expectations,
        }
    }

    /// A scope over `child` sharing this scope's context and buffers.
    pub fn child_scope(&mut self, child: TableId) -> TableScope<'_> {
        TableScope {
            arena: &mut *self.arena,
            table: child,
            context: &mut *self.context,
            instructions: &mut *self.instructions,
            expectations: &mut *self.expectations,
        }
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    /// This table's qualified name, the prefix of every tag it mints.
    pub fn name(&self) -> &str {
        &self.arena.node(self.table).name
    }

    pub fn grid(&self) -> SharedGrid {
        self.arena.node(self.table).grid.clone()
    }

    /// Read access to any node in the arena (a scenario definition, a
    /// parent, a child).
    pub fn node(&self, table: TableId) -> &TableNode {
        self.arena.node(table)
    }

    /// Resolves the fixture class named in the header cell. A header of
    /// the form `"prefix:ActualName"` uses only the part after the first
    /// `:`; the result is disgraced into class-name form.
    pub fn fixture_name(&self) -> Result<String, TrestleError> {
        let grid = self.grid();
        if grid.row_count() == 0 || grid.column_count(0) == 0 {
            return Err(self.syntax_error("table has no header cell", self.full_span()));
        }
        let header = grid.cell_text(0, 0);
        let fixture = match header.split_once(':') {
            Some((_, rest)) => rest,
            None => header.as_str(),
        };
        Ok(disgrace_class_name(fixture))
    }

    // --- tags and instructions ---------------------------------------

    /// Mints the next instruction tag for this table, `name_seq`, and
    /// advances the sequence counter. Tags are the only correlation key
    /// with returned results, so mint order must be transmission order.
    pub fn make_tag(&mut self) -> String {
        let node = self.arena.node_mut(self.table);
        let tag = format!("{}_{}", node.name, node.next_seq);
        node.next_seq += 1;
        tag
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Anchors an expectation to a cell of this table's grid. Registration
    /// order is evaluation order.
    pub fn expect(
        &mut self,
        tag: impl Into<String>,
        col: usize,
        row: usize,
        kind: ExpectationKind,
    ) {
        let expectation = Expectation::new(tag, col, row, self.grid(), kind);
        self.expectations.push(expectation);
    }

    /// Emits a `make` for the fixture named in the header cell, with this
    /// table's own name as the instance name.
    pub fn construct_fixture(&mut self) -> Result<String, TrestleError> {
        let fixture = self.fixture_name()?;
        let instance = self.name().to_owned();
        Ok(self.construct_instance(&instance, &fixture, 0, 0))
    }

    /// Emits a `make`, anchoring a Construction expectation at the
    /// class-name cell and one VoidReturn per argument cell, all on the
    /// instruction's tag. Arguments are the unescaped cells to the right
    /// of `class_col`.
    pub fn construct_instance(
        &mut self,
        instance: &str,
        class: &str,
        class_col: usize,
        row: usize,
    ) -> String {
        let tag = self.make_tag();
        let grid = self.grid();
        self.expect(tag.as_str(), class_col, row, ExpectationKind::Construction);

        let mut args = Vec::new();
        for col in (class_col + 1)..grid.column_count(row) {
            args.push(InstructionArg::Text(grid.unescaped_cell_text(col, row)));
            self.expect(tag.as_str(), col, row, ExpectationKind::VoidReturn);
        }

        self.emit(Instruction::new(
            tag.clone(),
            Operation::Make {
                instance: instance.into(),
                class: class.into(),
                args,
            },
        ));
        tag
    }

    /// Emits a `call` on a disgraced method name, returning its tag for
    /// the caller to anchor expectations on.
    pub fn call_function(
        &mut self,
        instance: &str,
        function: &str,
        args: Vec<InstructionArg>,
    ) -> String {
        let tag = self.make_tag();
        self.emit(Instruction::new(
            tag.clone(),
            Operation::Call {
                instance: instance.into(),
                method: disgrace_method_name(function),
                args,
            },
        ));
        tag
    }

    /// Emits a `callAndAssign` binding the returned value to `symbol` on
    /// both sides of the wire.
    pub fn call_and_assign(
        &mut self,
        symbol: &str,
        instance: &str,
        function: &str,
        args: Vec<InstructionArg>,
    ) -> String {
        let tag = self.make_tag();
        self.emit(Instruction::new(
            tag.clone(),
            Operation::CallAndAssign {
                symbol: symbol.into(),
                instance: instance.into(),
                method: disgrace_method_name(function),
                args,
            },
        ));
        tag
    }

    // --- children -----------------------------------------------------

    /// Creates a child table beneath this one: assigns its dotted id and
    /// its qualified name (consuming one tag from this table's sequence),
    /// renames the child grid, and splices it into this table's grid
    /// beneath `at_row`. The caller compiles the child through
    /// [`TableScope::child_scope`].
    pub fn attach_child(
        &mut self,
        table_type: &str,
        child_grid: SharedGrid,
        at_row: usize,
    ) -> TableId {
        let parent_tag = self.make_tag();
        let (child_id, parent_grid) = {
            let parent = self.arena.node(self.table);
            (
                format!("{}.{}", parent.id, parent.children.len()),
                parent.grid.clone(),
            )
        };
        let name = format!("{}/{}_{}", parent_tag, table_type, child_id);

        let child = self
            .arena
            .insert(child_id, name.clone(), Some(self.table), child_grid.clone());
        self.arena.node_mut(self.table).children.push(child);

        child_grid.set_name(&name);
        parent_grid.append_child_table(at_row, child_grid);
        child
    }

    // --- rows and cells ----------------------------------------------

    /// The table's body rows as raw cell text, header row excluded, for
    /// passing a table as an instruction argument.
    pub fn table_as_rows(&self) -> Vec<Vec<String>> {
        let grid = self.grid();
        (1..grid.row_count())
            .map(|row| {
                (0..grid.column_count(row))
                    .map(|col| grid.cell_text(col, row))
                    .collect()
            })
            .collect()
    }

    /// The symbol name when the cell holds an assignment (`$name=`).
    pub fn symbol_assignment_at(&self, col: usize, row: usize) -> Option<String> {
        let text = self.grid().cell_text(col, row);
        symbol_assignment(&text).map(str::to_owned)
    }

    // --- scenarios ----------------------------------------------------

    /// Registers this table as the definition of the named scenario.
    pub fn register_scenario(&mut self, name: impl Into<String>) {
        self.context.register_scenario(name, self.table);
    }

    /// Looks up a previously registered scenario definition.
    pub fn scenario(&self, name: &str) -> Option<TableId> {
        self.context.scenario(name)
    }

    // --- error reporting ---------------------------------------------

    fn table_source(&self) -> TableSource {
        let node = self.arena.node(self.table);
        TableSource::from_rows(node.name.clone(), &node.grid.rows())
    }

    /// Span over one row of this table's rendered source.
    pub fn row_span(&self, row: usize) -> SourceSpan {
        self.table_source().row_span(row)
    }

    /// Span over this table's whole rendered source.
    pub fn full_span(&self) -> SourceSpan {
        self.table_source().full_span()
    }
}

impl ErrorReporting for TableScope<'_> {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> TrestleError {
        let error_code = kind.diagnostic_code();
        TrestleError {
            kind,
            source_info: SourceInfo {
                source: self.table_source().to_named_source(),
                primary_span: span,
                phase: "compile".into(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

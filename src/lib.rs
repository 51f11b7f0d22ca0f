pub use crate::engine::TestPage;
pub use crate::errors::{ErrorKind, ErrorReporting, TrestleError};
pub use crate::grid::{Grid, SharedGrid};
pub use crate::instructions::{Instruction, InstructionResults, InstructionTransport};
pub use crate::results::{CellResult, TestSummary};
pub use crate::symbols::SymbolTable;
pub use crate::tables::{TableId, TableScope, TableVariant};

pub mod compare;
pub mod context;
pub mod engine;
pub mod errors;
pub mod escape;
pub mod expectations;
pub mod grid;
pub mod instructions;
pub mod normalize;
pub mod results;
pub mod symbols;
pub mod tables;

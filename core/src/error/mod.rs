#[allow(clippy::module_inception)]
pub mod error;
pub mod sheet;
pub mod task;

pub use error::{CatalogError, CliError, RunnerError};
pub use sheet::SheetError;
pub use task::{TaskError, TaskErrorKind};

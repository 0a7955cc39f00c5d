//! Builtin tools operating on conversation state.

mod edit;
mod todo_write;
mod write;

pub use edit::EditTool;
pub use todo_write::TodoWriteTool;
pub use write::WriteTool;

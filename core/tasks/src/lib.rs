//! Background task tracking for subagents.
//!
//! The [`TaskManager`] keeps the live table of background tasks, persists
//! every state change through a [`tandem_store::TaskStore`], and broadcasts
//! completion events so a session loop can push follow-up turns.

mod manager;

pub use manager::{TaskEvent, TaskManager};

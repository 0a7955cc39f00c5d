//! Durable stores for checkpoints and background tasks.
//!
//! Both contracts are thread-safe and linearisable per key. Three task-store
//! implementations (in-memory, file-per-task, key-value adapter) satisfy the
//! same contract and persist full records so any instance can recover them.

mod checkpoint_file;
mod checkpoint_memory;
mod checkpointer;
mod kv;
mod task_file;
mod task_kv;
mod task_memory;
mod task_store;

pub use checkpoint_file::FileCheckpointer;
pub use checkpoint_memory::MemoryCheckpointer;
pub use checkpointer::{Checkpointer, checkpoint_error};
pub use kv::{KeyValueStore, MemoryKv};
pub use task_file::FileTaskStore;
pub use task_kv::KvTaskStore;
pub use task_memory::MemoryTaskStore;
pub use task_store::{TaskStore, TaskStoreConfig};

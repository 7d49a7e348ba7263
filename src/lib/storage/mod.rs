pub mod memory;
#[cfg(feature = "storage")]
pub mod postgres;

use async_trait::async_trait;
use crate::core::{NewTodo, Todo};

/// Durable home of todo records. Implementations own id assignment and
/// creation timestamps; every mutating call is a single write.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Trivial round-trip used by the startup probe and `/health`.
    async fn ping(&self) -> anyhow::Result<()>;
    /// All records, ascending by id.
    async fn list(&self) -> anyhow::Result<Vec<Todo>>;
    async fn get(&self, id: i32) -> anyhow::Result<Option<Todo>>;
    async fn create(&self, todo: NewTodo) -> anyhow::Result<Todo>;
    /// Overwrites the mutable fields and `updated_at` of `todo.id`.
    /// Returns `None` when the record no longer exists.
    async fn update(&self, todo: &Todo) -> anyhow::Result<Option<Todo>>;
    async fn delete(&self, id: i32) -> anyhow::Result<Option<Todo>>;
}

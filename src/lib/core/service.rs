use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{CreateTodo, NewTodo, Todo, TodoError, TodoPatch};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// Outcome of a storage round-trip, as reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// The CRUD contract over todos. Holds no state between calls besides the
/// storage handle.
pub struct TodoService<S: Storage + 'static> {
    storage: Arc<S>,
}

impl<S: Storage + 'static> Clone for TodoService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: Storage + 'static> TodoService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        self.storage
            .list()
            .await
            .map_err(|e| TodoError::storage("fetch todos", e))
    }

    pub async fn get(&self, id: i32) -> Result<Todo, TodoError> {
        self.storage
            .get(id)
            .await
            .map_err(|e| TodoError::storage("fetch todo", e))?
            .ok_or(TodoError::NotFound)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, input)))]
    pub async fn create(&self, input: CreateTodo) -> Result<Todo, TodoError> {
        let new = NewTodo::try_from(input)?;
        let todo = self
            .storage
            .create(new)
            .await
            .map_err(|e| TodoError::storage("create todo", e))?;
        #[cfg(feature = "tracing")]
        debug!(id = todo.id, "Created todo");
        Ok(todo)
    }

    /// Loads the record, merges `patch` onto it and writes the result back.
    #[cfg_attr(feature = "tracing", instrument(skip(self, patch)))]
    pub async fn update(&self, id: i32, patch: TodoPatch) -> Result<Todo, TodoError> {
        patch.validate()?;
        let current = self
            .storage
            .get(id)
            .await
            .map_err(|e| TodoError::storage("update todo", e))?
            .ok_or(TodoError::NotFound)?;
        let merged = patch.apply(&current, Utc::now());
        let todo = self
            .storage
            .update(&merged)
            .await
            .map_err(|e| TodoError::storage("update todo", e))?
            .ok_or(TodoError::NotFound)?;
        #[cfg(feature = "tracing")]
        debug!(id, completed = todo.completed, "Updated todo");
        Ok(todo)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete(&self, id: i32) -> Result<Todo, TodoError> {
        let todo = self
            .storage
            .delete(id)
            .await
            .map_err(|e| TodoError::storage("delete todo", e))?
            .ok_or(TodoError::NotFound)?;
        #[cfg(feature = "tracing")]
        debug!(id, "Deleted todo");
        Ok(todo)
    }

    pub async fn health(&self) -> HealthReport {
        let timestamp = Utc::now();
        match self.storage.ping().await {
            Ok(()) => HealthReport {
                status: "healthy",
                timestamp,
                database: "connected",
                error: None,
            },
            Err(e) => HealthReport {
                status: "unhealthy",
                timestamp,
                database: "disconnected",
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn service() -> TodoService<MemoryStorage> {
        TodoService::new(Arc::new(MemoryStorage::new()))
    }

    fn create(task: &str) -> CreateTodo {
        CreateTodo {
            task: Some(task.to_string()),
            description: None,
        }
    }

    #[tokio::test]
    async fn rejected_create_persists_nothing() {
        let service = service();
        let err = service.create(CreateTodo::default()).await.unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_todo_is_not_found() {
        let service = service();
        let err = service.update(42, TodoPatch::default()).await.unwrap_err();
        assert!(matches!(err, TodoError::NotFound));
    }

    #[tokio::test]
    async fn update_with_blank_task_is_rejected_and_leaves_record() {
        let service = service();
        let todo = service.create(create("Keep me")).await.unwrap();
        let patch = TodoPatch {
            task: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(todo.id, patch).await,
            Err(TodoError::Validation(_))
        ));
        assert_eq!(service.get(todo.id).await.unwrap().task, "Keep me");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let service = service();
        let todo = service.create(create("Short-lived")).await.unwrap();
        let deleted = service.delete(todo.id).await.unwrap();
        assert_eq!(deleted, todo);
        assert!(matches!(service.get(todo.id).await, Err(TodoError::NotFound)));
        assert!(matches!(service.delete(todo.id).await, Err(TodoError::NotFound)));
    }

    #[tokio::test]
    async fn list_after_creates_and_deletes() {
        let service = service();
        for i in 0..6 {
            service.create(create(&format!("task {i}"))).await.unwrap();
        }
        for id in [2, 5] {
            service.delete(id).await.unwrap();
        }
        let ids: Vec<i32> = service.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 6]);
    }

    #[tokio::test]
    async fn healthy_memory_store() {
        let report = service().health().await;
        assert!(report.is_healthy());
        assert_eq!(report.status, "healthy");
        assert_eq!(report.database, "connected");
    }
}

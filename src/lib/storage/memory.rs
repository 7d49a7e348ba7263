use std::collections::BTreeMap;

use async_trait::async_trait;
use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::core::{NewTodo, Todo};

use super::Storage;

#[derive(Default)]
struct Inner {
    todos: BTreeMap<i32, Todo>,
    last_id: i32,
}

/// In-process store for tests and demo mode. Ids are handed out under the
/// same lock that inserts the record, so concurrent writers never collide.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with the two demo todos.
    pub fn seeded() -> Self {
        let mut inner = Inner::default();
        for task in ["Learn Docker", "Build an image"] {
            insert(
                &mut inner,
                NewTodo {
                    task: task.to_string(),
                    description: String::new(),
                },
            );
        }
        Self {
            inner: Mutex::new(inner),
        }
    }
}

fn insert(inner: &mut Inner, new: NewTodo) -> Todo {
    inner.last_id += 1;
    let now = Utc::now();
    let todo = Todo {
        id: inner.last_id,
        task: new.task,
        description: new.description,
        completed: false,
        created_at: now,
        updated_at: now,
    };
    inner.todos.insert(todo.id, todo.clone());
    todo
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        Ok(self.inner.lock().await.todos.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Todo>> {
        Ok(self.inner.lock().await.todos.get(&id).cloned())
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo> {
        let mut inner = self.inner.lock().await;
        Ok(insert(&mut inner, todo))
    }

    async fn update(&self, todo: &Todo) -> Result<Option<Todo>> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.todos.get_mut(&todo.id) else {
            return Ok(None);
        };
        stored.task = todo.task.clone();
        stored.description = todo.description.clone();
        stored.completed = todo.completed;
        stored.updated_at = todo.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i32) -> Result<Option<Todo>> {
        Ok(self.inner.lock().await.todos.remove(&id))
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::TodoError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "storage", derive(sqlx::FromRow))]
pub struct Todo {
    pub id: i32,
    pub task: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /todos`. Both fields are optional on the wire so that a
/// missing `task` is reported as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTodo {
    pub task: Option<String>,
    pub description: Option<String>,
}

/// A validated creation request, ready to hand to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub task: String,
    pub description: String,
}

impl TryFrom<CreateTodo> for NewTodo {
    type Error = TodoError;

    fn try_from(input: CreateTodo) -> Result<Self, Self::Error> {
        let task = input
            .task
            .filter(|task| !task.trim().is_empty())
            .ok_or_else(|| TodoError::Validation("Task is required".into()))?;
        Ok(Self {
            task,
            description: input.description.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /todos/{id}`. Every omitted field keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn validate(&self) -> Result<(), TodoError> {
        match &self.task {
            Some(task) if task.trim().is_empty() => {
                Err(TodoError::Validation("Task cannot be empty".into()))
            }
            _ => Ok(()),
        }
    }

    /// Merges the patch onto `todo`. `updated_at` always moves forward, even
    /// when `now` does not (coarse clocks, skew between app and database).
    pub fn apply(&self, todo: &Todo, now: DateTime<Utc>) -> Todo {
        let floor = todo.updated_at + Duration::microseconds(1);
        Todo {
            id: todo.id,
            task: self.task.clone().unwrap_or_else(|| todo.task.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| todo.description.clone()),
            completed: self.completed.unwrap_or(todo.completed),
            created_at: todo.created_at,
            updated_at: now.max(floor),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedTodo {
    pub message: String,
    pub todo: Todo,
}

impl From<Todo> for DeletedTodo {
    fn from(todo: Todo) -> Self {
        Self {
            message: "Todo deleted successfully".to_string(),
            todo,
        }
    }
}

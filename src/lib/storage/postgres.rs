use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::core::{NewTodo, Todo};
use crate::storage::Storage;

const COLUMNS: &str = "id, task, description, completed, created_at, updated_at";

/// Pooled PostgreSQL store. The pool connects lazily, so building one never
/// fails on an unreachable server; the first `ping` tells.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy_with(options);
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id SERIAL PRIMARY KEY,
                task TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("failed to create todos table")?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {COLUMNS} FROM todos ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn get(&self, id: i32) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!("SELECT {COLUMNS} FROM todos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo> {
        let created = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (task, description, completed) VALUES ($1, $2, FALSE) RETURNING {COLUMNS}"
        ))
        .bind(todo.task)
        .bind(todo.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, todo: &Todo) -> Result<Option<Todo>> {
        let updated = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET task = $1, description = $2, completed = $3, updated_at = $4
             WHERE id = $5 RETURNING {COLUMNS}"
        ))
        .bind(&todo.task)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.updated_at)
        .bind(todo.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<Option<Todo>> {
        let deleted = sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deleted)
    }
}

use crate::db::models::{Status, Task, TaskUpdate};
use crate::error::Result;
use crate::log_entity_operation;
use sqlx::SqlitePool;

const TASK_COLUMNS: &str = "id, name, description, status, project_id";

pub struct TaskManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TaskManager<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a new task under a project
    pub async fn add_task(
        &self,
        name: &str,
        description: Option<&str>,
        status: Status,
        project_id: i64,
    ) -> Result<Task> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (name, description, status, project_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(status.as_str())
        .bind(project_id)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        log_entity_operation!("task", "create", id, project_id);

        Ok(Task {
            id,
            name: name.to_string(),
            description: description.map(String::from),
            status,
            project_id,
        })
    }

    /// Get a task by ID
    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(task)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(tasks)
    }

    /// Tasks that reference the given project
    pub async fn list_tasks_by_project(&self, project_id: i64) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? ORDER BY id ASC"
        ))
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tasks)
    }

    /// Overwrite the supplied fields of a task, keeping the rest
    pub async fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Option<Task>> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                project_id = COALESCE(?, project_id)
            WHERE id = ?
            "#,
        )
        .bind(update.name)
        .bind(update.description)
        .bind(update.status.map(Status::as_str))
        .bind(update.project_id)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        log_entity_operation!("task", "update", id);
        self.get_task(id).await
    }

    /// Delete a task, returning the deleted record
    pub async fn delete_task(&self, id: i64) -> Result<Option<Task>> {
        let Some(task) = self.get_task(id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        log_entity_operation!("task", "delete", id);
        Ok(Some(task))
    }
}

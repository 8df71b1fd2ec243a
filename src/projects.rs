use crate::db::models::{Project, ProjectUpdate, Status};
use crate::error::Result;
use crate::log_entity_operation;
use sqlx::SqlitePool;

const PROJECT_COLUMNS: &str = "id, name, description, status, client_id";

pub struct ProjectManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProjectManager<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a new project for a client.
    ///
    /// The client reference is stored as given; it is not checked.
    pub async fn add_project(
        &self,
        name: &str,
        description: &str,
        status: Status,
        client_id: i64,
    ) -> Result<Project> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, status, client_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(status.as_str())
        .bind(client_id)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        log_entity_operation!("project", "create", id, client_id);

        Ok(Project {
            id,
            name: name.to_string(),
            description: description.to_string(),
            status,
            client_id,
        })
    }

    /// Get a project by ID
    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(projects)
    }

    /// Projects that reference the given client
    pub async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE client_id = ? ORDER BY id ASC"
        ))
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        Ok(projects)
    }

    /// Overwrite the supplied fields of a project, keeping the rest
    pub async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Option<Project>> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                client_id = COALESCE(?, client_id)
            WHERE id = ?
            "#,
        )
        .bind(update.name)
        .bind(update.description)
        .bind(update.status.map(Status::as_str))
        .bind(update.client_id)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        log_entity_operation!("project", "update", id);
        self.get_project(id).await
    }

    /// Delete a project and its tasks, returning the deleted project
    pub async fn delete_project(&self, id: i64) -> Result<Option<Project>> {
        let Some(project) = self.get_project(id).await? else {
            return Ok(None);
        };

        let tasks = sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        tracing::info!(
            entity = "project",
            operation = "delete",
            id,
            cascaded_tasks = tasks.rows_affected(),
            "Entity operation"
        );

        Ok(Some(project))
    }
}

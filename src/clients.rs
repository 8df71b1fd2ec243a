use crate::db::models::Client;
use crate::error::Result;
use crate::log_entity_operation;
use sqlx::SqlitePool;

const CLIENT_COLUMNS: &str = "id, name, email, phone";

pub struct ClientManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClientManager<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a new client
    pub async fn add_client(&self, name: &str, email: &str, phone: &str) -> Result<Client> {
        let result = sqlx::query("INSERT INTO clients (name, email, phone) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(phone)
            .execute(self.pool)
            .await?;

        let id = result.last_insert_rowid();
        log_entity_operation!("client", "create", id);

        Ok(Client {
            id,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Get a client by ID. A missing client is `None`, not an error.
    pub async fn get_client(&self, id: i64) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(client)
    }

    /// All clients in insertion order
    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(clients)
    }

    /// Overwrite every field of a client and return the stored record
    pub async fn update_client(
        &self,
        id: i64,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<Option<Client>> {
        let result = sqlx::query("UPDATE clients SET name = ?, email = ?, phone = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        log_entity_operation!("client", "update", id);
        self.get_client(id).await
    }

    /// Delete a client together with its projects and their tasks.
    ///
    /// Returns the deleted client. The cascade runs as separate statements
    /// ahead of the primary delete; a failure part way leaves the earlier
    /// deletes in place.
    pub async fn delete_client(&self, id: i64) -> Result<Option<Client>> {
        let Some(client) = self.get_client(id).await? else {
            return Ok(None);
        };

        let tasks = sqlx::query(
            "DELETE FROM tasks WHERE project_id IN (SELECT id FROM projects WHERE client_id = ?)",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        let projects = sqlx::query("DELETE FROM projects WHERE client_id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        tracing::info!(
            entity = "client",
            operation = "delete",
            id,
            cascaded_projects = projects.rows_affected(),
            cascaded_tasks = tasks.rows_affected(),
            "Entity operation"
        );

        Ok(Some(client))
    }
}

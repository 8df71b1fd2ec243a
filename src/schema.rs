//! GraphQL schema: object types, the query root and the mutation root.
//!
//! Relationship fields (`Project.client`, `Task.project`) resolve with a
//! point lookup on the stored reference. Lookups that find nothing resolve
//! to `null`; store failures surface as GraphQL errors carrying an
//! `extensions.code`.

use crate::clients::ClientManager;
use crate::db::models::{Client, Project, ProjectUpdate, Status, Task, TaskUpdate};
use crate::error::TrackerError;
use crate::log_error;
use crate::projects::ProjectManager;
use crate::tasks::TaskManager;
use async_graphql::parser::types::{ExecutableDocument, OperationDefinition};
use async_graphql::{
    Context, EmptySubscription, Enum, ErrorExtensions, Object, Result, Schema, ID,
};
use sqlx::SqlitePool;

pub type TrackerSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema over a store pool
pub fn build_schema(pool: SqlitePool) -> TrackerSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(pool)
        .finish()
}

/// The operation a request runs: the one named by `operation_name`, or the
/// only operation in the document. `None` when the choice is ambiguous or
/// the name matches nothing.
pub fn selected_operation<'d>(
    document: &'d ExecutableDocument,
    operation_name: Option<&str>,
) -> Option<&'d OperationDefinition> {
    match operation_name {
        Some(wanted) => document
            .operations
            .iter()
            .find(|(name, _)| name.map(|n| n.as_str()) == Some(wanted))
            .map(|(_, operation)| &operation.node),
        None => {
            let mut operations = document.operations.iter();
            let (_, only) = operations.next()?;
            match operations.next() {
                Some(_) => None,
                None => Some(&only.node),
            }
        },
    }
}

fn pool<'c>(ctx: &Context<'c>) -> Result<&'c SqlitePool> {
    ctx.data::<SqlitePool>()
}

/// Lookup ids that are not integers cannot match a stored record.
fn lookup_id(id: &ID) -> Option<i64> {
    id.parse().ok()
}

/// Reference ids are written to the store, so they must be integers.
fn reference_id(id: &ID, field: &str) -> Result<i64> {
    id.parse().map_err(|_| {
        TrackerError::InvalidInput(format!("{field} must be an integer id, got '{}'", id.as_str()))
            .extend()
    })
}

/// Lists are nullable with nullable members, like every other output type
fn nullable_list<T>(items: Vec<T>) -> Option<Vec<Option<T>>> {
    Some(items.into_iter().map(Some).collect())
}

fn store_error(context: &'static str) -> impl Fn(TrackerError) -> async_graphql::Error {
    move |e| {
        log_error!(e, context);
        e.extend()
    }
}

macro_rules! status_argument {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Enum, Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub enum $name {
            #[default]
            #[graphql(name = "new")]
            New,
            #[graphql(name = "progress")]
            Progress,
            #[graphql(name = "completed")]
            Completed,
        }

        impl From<$name> for Status {
            fn from(value: $name) -> Self {
                match value {
                    $name::New => Status::NotStarted,
                    $name::Progress => Status::InProgress,
                    $name::Completed => Status::Completed,
                }
            }
        }
    };
}

status_argument!(
    /// Initial status of a new project
    ProjectStatus
);
status_argument!(
    /// Replacement status for an existing project
    ProjectStatusUpdate
);
status_argument!(
    /// Initial status of a new task
    TaskStatus
);
status_argument!(
    /// Replacement status for an existing task
    TaskStatusUpdate
);

#[Object]
impl Client {
    async fn id(&self) -> Option<ID> {
        Some(ID(self.id.to_string()))
    }

    async fn name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    async fn email(&self) -> Option<&str> {
        Some(self.email.as_str())
    }

    async fn phone(&self) -> Option<&str> {
        Some(self.phone.as_str())
    }
}

#[Object]
impl Project {
    async fn id(&self) -> Option<ID> {
        Some(ID(self.id.to_string()))
    }

    async fn name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    async fn description(&self) -> Option<&str> {
        Some(self.description.as_str())
    }

    async fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    /// The owning client, or null when the reference is dangling
    async fn client(&self, ctx: &Context<'_>) -> Result<Option<Client>> {
        ClientManager::new(pool(ctx)?)
            .get_client(self.client_id)
            .await
            .map_err(store_error("resolve Project.client"))
    }
}

#[Object]
impl Task {
    async fn id(&self) -> Option<ID> {
        Some(ID(self.id.to_string()))
    }

    async fn name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    async fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    /// The owning project, or null when the reference is dangling
    async fn project(&self, ctx: &Context<'_>) -> Result<Option<Project>> {
        ProjectManager::new(pool(ctx)?)
            .get_project(self.project_id)
            .await
            .map_err(store_error("resolve Task.project"))
    }
}

pub struct QueryRoot;

#[Object(name = "RootQueryType")]
impl QueryRoot {
    async fn projects(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<Project>>>> {
        ProjectManager::new(pool(ctx)?)
            .list_projects()
            .await
            .map(nullable_list)
            .map_err(store_error("query projects"))
    }

    async fn project(&self, ctx: &Context<'_>, id: Option<ID>) -> Result<Option<Project>> {
        let Some(id) = id.as_ref().and_then(lookup_id) else {
            return Ok(None);
        };
        ProjectManager::new(pool(ctx)?)
            .get_project(id)
            .await
            .map_err(store_error("query project"))
    }

    async fn clients(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<Client>>>> {
        ClientManager::new(pool(ctx)?)
            .list_clients()
            .await
            .map(nullable_list)
            .map_err(store_error("query clients"))
    }

    async fn client(&self, ctx: &Context<'_>, id: Option<ID>) -> Result<Option<Client>> {
        let Some(id) = id.as_ref().and_then(lookup_id) else {
            return Ok(None);
        };
        ClientManager::new(pool(ctx)?)
            .get_client(id)
            .await
            .map_err(store_error("query client"))
    }

    async fn projects_by_client_id(
        &self,
        ctx: &Context<'_>,
        client_id: Option<ID>,
    ) -> Result<Option<Vec<Option<Project>>>> {
        let Some(client_id) = client_id.as_ref().and_then(lookup_id) else {
            return Ok(Some(Vec::new()));
        };
        ProjectManager::new(pool(ctx)?)
            .list_projects_by_client(client_id)
            .await
            .map(nullable_list)
            .map_err(store_error("query projectsByClientId"))
    }

    async fn tasks(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<Task>>>> {
        TaskManager::new(pool(ctx)?)
            .list_tasks()
            .await
            .map(nullable_list)
            .map_err(store_error("query tasks"))
    }

    async fn task(&self, ctx: &Context<'_>, id: Option<ID>) -> Result<Option<Task>> {
        let Some(id) = id.as_ref().and_then(lookup_id) else {
            return Ok(None);
        };
        TaskManager::new(pool(ctx)?)
            .get_task(id)
            .await
            .map_err(store_error("query task"))
    }

    async fn tasks_by_project_id(
        &self,
        ctx: &Context<'_>,
        project_id: Option<ID>,
    ) -> Result<Option<Vec<Option<Task>>>> {
        let Some(project_id) = project_id.as_ref().and_then(lookup_id) else {
            return Ok(Some(Vec::new()));
        };
        TaskManager::new(pool(ctx)?)
            .list_tasks_by_project(project_id)
            .await
            .map(nullable_list)
            .map_err(store_error("query tasksByProjectId"))
    }
}

pub struct MutationRoot;

#[Object(name = "Mutation")]
impl MutationRoot {
    async fn add_client(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        phone: String,
    ) -> Result<Option<Client>> {
        ClientManager::new(pool(ctx)?)
            .add_client(&name, &email, &phone)
            .await
            .map(Some)
            .map_err(store_error("mutation addClient"))
    }

    async fn update_client(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: String,
        email: String,
        phone: String,
    ) -> Result<Option<Client>> {
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        ClientManager::new(pool(ctx)?)
            .update_client(id, &name, &email, &phone)
            .await
            .map_err(store_error("mutation updateClient"))
    }

    /// Delete a client along with its projects and their tasks
    async fn delete_client(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Client>> {
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        ClientManager::new(pool(ctx)?)
            .delete_client(id)
            .await
            .map_err(store_error("mutation deleteClient"))
    }

    async fn add_project(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
        #[graphql(default)] status: ProjectStatus,
        client_id: ID,
    ) -> Result<Option<Project>> {
        let client_id = reference_id(&client_id, "clientId")?;
        ProjectManager::new(pool(ctx)?)
            .add_project(&name, &description, status.into(), client_id)
            .await
            .map(Some)
            .map_err(store_error("mutation addProject"))
    }

    /// Delete a project along with its tasks
    async fn delete_project(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Project>> {
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        ProjectManager::new(pool(ctx)?)
            .delete_project(id)
            .await
            .map_err(store_error("mutation deleteProject"))
    }

    async fn update_project(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        description: Option<String>,
        status: Option<ProjectStatusUpdate>,
        client_id: ID,
    ) -> Result<Option<Project>> {
        let client_id = reference_id(&client_id, "clientId")?;
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        let update = ProjectUpdate {
            name,
            description,
            status: status.map(Status::from),
            client_id: Some(client_id),
        };
        ProjectManager::new(pool(ctx)?)
            .update_project(id, update)
            .await
            .map_err(store_error("mutation updateProject"))
    }

    async fn add_task(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: Option<String>,
        #[graphql(default)] status: TaskStatus,
        project_id: ID,
    ) -> Result<Option<Task>> {
        let project_id = reference_id(&project_id, "projectId")?;
        TaskManager::new(pool(ctx)?)
            .add_task(&name, description.as_deref(), status.into(), project_id)
            .await
            .map(Some)
            .map_err(store_error("mutation addTask"))
    }

    async fn update_task(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        description: Option<String>,
        status: Option<TaskStatusUpdate>,
        project_id: Option<ID>,
    ) -> Result<Option<Task>> {
        let project_id = project_id
            .as_ref()
            .map(|pid| reference_id(pid, "projectId"))
            .transpose()?;
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        let update = TaskUpdate {
            name,
            description,
            status: status.map(Status::from),
            project_id,
        };
        TaskManager::new(pool(ctx)?)
            .update_task(id, update)
            .await
            .map_err(store_error("mutation updateTask"))
    }

    async fn delete_task(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Task>> {
        let Some(id) = lookup_id(&id) else {
            return Ok(None);
        };
        TaskManager::new(pool(ctx)?)
            .delete_task(id)
            .await
            .map_err(store_error("mutation deleteTask"))
    }
}

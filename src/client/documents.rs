//! Query and mutation documents used by the web UI.
//!
//! Every selection asks for `__typename` and `id` so results can be
//! normalized into the cache.

pub const GET_CLIENTS: &str = r#"
query GetClients {
  clients { __typename id name email phone }
}
"#;

pub const GET_CLIENT: &str = r#"
query GetClient($id: ID!) {
  client(id: $id) { __typename id name email phone }
}
"#;

pub const GET_PROJECTS: &str = r#"
query GetProjects {
  projects {
    __typename id name status
    client { __typename id name }
  }
}
"#;

pub const GET_PROJECT: &str = r#"
query GetProject($id: ID!) {
  project(id: $id) {
    __typename id name description status
    client { __typename id name email phone }
  }
}
"#;

pub const GET_PROJECTS_BY_CLIENT: &str = r#"
query GetProjectsByClient($clientId: ID!) {
  projectsByClientId(clientId: $clientId) {
    __typename id name description status
    client { __typename id name email phone }
  }
}
"#;

pub const GET_TASKS: &str = r#"
query GetTasks {
  tasks {
    __typename id name status
    project { __typename id name }
  }
}
"#;

pub const GET_TASK: &str = r#"
query GetTask($id: ID!) {
  task(id: $id) {
    __typename id name description status
    project {
      __typename id name description status
      client { __typename id name }
    }
  }
}
"#;

pub const GET_TASKS_BY_PROJECT: &str = r#"
query GetTasksByProject($projectId: ID!) {
  tasksByProjectId(projectId: $projectId) {
    __typename id name description status
    project {
      __typename id name status
      client { __typename id name }
    }
  }
}
"#;

pub const ADD_CLIENT: &str = r#"
mutation AddClient($name: String!, $email: String!, $phone: String!) {
  addClient(name: $name, email: $email, phone: $phone) { __typename id name email phone }
}
"#;

pub const DELETE_CLIENT: &str = r#"
mutation DeleteClient($id: ID!) {
  deleteClient(id: $id) { __typename id name email phone }
}
"#;

pub const ADD_PROJECT: &str = r#"
mutation AddProject($name: String!, $description: String!, $status: ProjectStatus!, $clientId: ID!) {
  addProject(name: $name, description: $description, status: $status, clientId: $clientId) {
    __typename id name description status
    client { __typename id name }
  }
}
"#;

pub const UPDATE_PROJECT: &str = r#"
mutation UpdateProject($id: ID!, $name: String, $description: String, $status: ProjectStatusUpdate, $clientId: ID!) {
  updateProject(id: $id, name: $name, description: $description, status: $status, clientId: $clientId) {
    __typename id name description status
    client { __typename id name email phone }
  }
}
"#;

pub const DELETE_PROJECT: &str = r#"
mutation DeleteProject($id: ID!) {
  deleteProject(id: $id) { __typename id }
}
"#;

pub const ADD_TASK: &str = r#"
mutation AddTask($name: String!, $description: String, $status: TaskStatus!, $projectId: ID!) {
  addTask(name: $name, description: $description, status: $status, projectId: $projectId) {
    __typename id name description status
    project { __typename id name }
  }
}
"#;

pub const UPDATE_TASK: &str = r#"
mutation UpdateTask($id: ID!, $name: String, $description: String, $status: TaskStatusUpdate, $projectId: ID) {
  updateTask(id: $id, name: $name, description: $description, status: $status, projectId: $projectId) {
    __typename id name description status
    project { __typename id name description status }
  }
}
"#;

pub const DELETE_TASK: &str = r#"
mutation DeleteTask($id: ID!) {
  deleteTask(id: $id) { __typename id }
}
"#;

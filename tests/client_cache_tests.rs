//! API client against a live server: queries fill the cache, mutations
//! refetch their lists.

mod common;

use project_tracker::client::documents::{
    ADD_CLIENT, ADD_PROJECT, DELETE_CLIENT, GET_CLIENTS, GET_PROJECTS, GET_TASK, UPDATE_TASK,
};
use project_tracker::client::{ApiClient, RefetchQuery};
use serde_json::{json, Value};

#[tokio::test]
async fn test_query_populates_cache() {
    let (_dir, _pool, url) = common::spawn_server().await;
    let mut client = ApiClient::new(url);

    client
        .mutate(
            ADD_CLIENT,
            json!({ "name": "Ada", "email": "ada@example.com", "phone": "555" }),
            &[],
        )
        .await
        .unwrap();

    let data = client.query(GET_CLIENTS, Value::Null).await.unwrap();
    assert_eq!(data["clients"][0]["name"], "Ada");

    let cached = client.cache().read_query("clients", &Value::Null).unwrap();
    assert_eq!(cached, data["clients"]);
    assert!(client.cache().contains("Client", "1"));
}

#[tokio::test]
async fn test_add_project_refetches_project_list() {
    let (_dir, _pool, url) = common::spawn_server().await;
    let mut client = ApiClient::new(url);

    client
        .mutate(
            ADD_CLIENT,
            json!({ "name": "Grace", "email": "grace@navy.mil", "phone": "1" }),
            &[],
        )
        .await
        .unwrap();
    client.query(GET_PROJECTS, Value::Null).await.unwrap();
    assert_eq!(
        client.cache().read_query("projects", &Value::Null),
        Some(json!([]))
    );

    let data = client
        .mutate(
            ADD_PROJECT,
            json!({ "name": "COBOL", "description": "Compiler", "status": "progress", "clientId": "1" }),
            &[RefetchQuery::new(GET_PROJECTS)],
        )
        .await
        .unwrap();
    assert_eq!(data["addProject"]["status"], "In Progress");

    let projects = client.cache().read_query("projects", &Value::Null).unwrap();
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["client"]["name"], "Grace");
}

#[tokio::test]
async fn test_delete_client_refetch_clears_lists() {
    let (_dir, _pool, url) = common::spawn_server().await;
    let mut client = ApiClient::new(url);

    client
        .mutate(
            ADD_CLIENT,
            json!({ "name": "Linus", "email": "l@kernel.org", "phone": "0" }),
            &[],
        )
        .await
        .unwrap();
    client
        .mutate(
            ADD_PROJECT,
            json!({ "name": "Kernel", "description": "Monolith", "status": "new", "clientId": "1" }),
            &[RefetchQuery::new(GET_CLIENTS), RefetchQuery::new(GET_PROJECTS)],
        )
        .await
        .unwrap();
    assert_eq!(
        client
            .cache()
            .read_query("projects", &Value::Null)
            .unwrap()
            .as_array()
            .unwrap()
            .len(),
        1
    );

    client
        .mutate(
            DELETE_CLIENT,
            json!({ "id": "1" }),
            &[RefetchQuery::new(GET_CLIENTS), RefetchQuery::new(GET_PROJECTS)],
        )
        .await
        .unwrap();

    assert_eq!(
        client.cache().read_query("clients", &Value::Null),
        Some(json!([]))
    );
    assert_eq!(
        client.cache().read_query("projects", &Value::Null),
        Some(json!([]))
    );
}

#[tokio::test]
async fn test_update_task_refetches_detail_query() {
    let (_dir, pool, url) = common::spawn_server().await;
    project_tracker::tasks::TaskManager::new(&pool)
        .add_task(
            "Ship",
            Some("Release notes"),
            project_tracker::db::models::Status::NotStarted,
            1,
        )
        .await
        .unwrap();

    let mut client = ApiClient::new(url);
    let vars = json!({ "id": "1" });
    client.query(GET_TASK, vars.clone()).await.unwrap();

    client
        .mutate(
            UPDATE_TASK,
            json!({ "id": "1", "status": "completed" }),
            &[RefetchQuery::with_variables(GET_TASK, vars.clone())],
        )
        .await
        .unwrap();

    let task = client.cache().read_query("task", &vars).unwrap();
    assert_eq!(task["status"], "Completed");
    assert_eq!(task["description"], "Release notes");
    assert_eq!(task["project"], Value::Null);
}

#[tokio::test]
async fn test_server_errors_surface_as_graphql_error() {
    let (_dir, _pool, url) = common::spawn_server().await;
    let client = ApiClient::new(url);

    let err = client
        .execute("{ clients { nickname } }", &Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.to_error_code(), "GRAPHQL_ERROR");
    assert!(err.to_string().contains("nickname"));
}

#[tokio::test]
async fn test_inline_and_aliased_lookups_keep_separate_entries() {
    let (_dir, pool, url) = common::spawn_server().await;
    let clients = project_tracker::clients::ClientManager::new(&pool);
    clients.add_client("Peter", "peter@dailybugle.com", "1").await.unwrap();
    clients.add_client("Mary Jane", "mj@stage.com", "2").await.unwrap();

    let mut client = ApiClient::new(url);
    client
        .query(r#"{ client(id: "1") { __typename id name } }"#, Value::Null)
        .await
        .unwrap();
    client
        .query(r#"{ other: client(id: "2") { __typename id name } }"#, Value::Null)
        .await
        .unwrap();

    let cache = client.cache();
    assert_eq!(cache.read_query("client", &json!({ "id": "1" })).unwrap()["name"], "Peter");
    assert_eq!(cache.read_query("client", &json!({ "id": "2" })).unwrap()["name"], "Mary Jane");
    assert_eq!(cache.read_query("other", &Value::Null), None);
}

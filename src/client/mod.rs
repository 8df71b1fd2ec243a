//! HTTP client for the GraphQL endpoint, backed by a [`NormalizedCache`].
//!
//! Queries write their results into the cache. Mutations write the returned
//! record and then re-run their refetch list, so list views pick up
//! inserts and deletes from the server rather than patching the cache.

pub mod cache;
pub mod documents;

pub use cache::{EntityKey, NormalizedCache};

use crate::error::{Result, TrackerError};
use serde::Deserialize;
use serde_json::{json, Value};

/// A query to re-run after a mutation succeeds
#[derive(Debug, Clone)]
pub struct RefetchQuery {
    pub document: String,
    pub variables: Value,
}

impl RefetchQuery {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            variables: Value::Null,
        }
    }

    pub fn with_variables(document: impl Into<String>, variables: Value) -> Self {
        Self {
            document: document.into(),
            variables,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorBody {
    message: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    cache: NormalizedCache,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            cache: NormalizedCache::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut NormalizedCache {
        &mut self.cache
    }

    /// Send a document and return its `data`, bypassing the cache.
    ///
    /// Any entry in the response's `errors` list fails the call.
    pub async fn execute(&self, document: &str, variables: &Value) -> Result<Value> {
        let mut body = json!({ "query": document });
        if !variables.is_null() {
            body["variables"] = variables.clone();
        }

        tracing::debug!(endpoint = %self.endpoint, "Sending GraphQL request");
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        let text = response.text().await?;
        let parsed: GraphqlResponse = serde_json::from_str(&text).map_err(|_| {
            TrackerError::GraphqlError(format!("HTTP {}: {}", status, text.trim()))
        })?;

        if !parsed.errors.is_empty() {
            let messages: Vec<_> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(TrackerError::GraphqlError(messages.join("; ")));
        }

        if !status.is_success() {
            return Err(TrackerError::GraphqlError(format!("HTTP {}", status)));
        }

        Ok(parsed.data.unwrap_or(Value::Null))
    }

    /// Run a query and store its result in the cache
    pub async fn query(&mut self, document: &str, variables: Value) -> Result<Value> {
        let data = self.execute(document, &variables).await?;
        self.cache.write_query(document, &data, &variables)?;
        Ok(data)
    }

    /// Run a mutation, store the returned record, then re-run each refetch
    /// query in order.
    ///
    /// A failed refetch is returned as the error; the mutation itself has
    /// already been applied on the server by then.
    pub async fn mutate(
        &mut self,
        document: &str,
        variables: Value,
        refetch: &[RefetchQuery],
    ) -> Result<Value> {
        let data = self.execute(document, &variables).await?;
        self.cache.write_result(&data);

        for query in refetch {
            self.query(&query.document, query.variables.clone()).await?;
        }

        Ok(data)
    }
}

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::operation::Operation;
use super::types::{GraphQlError, GraphQlResponse};
use crate::query::QueryVariables;

pub const ANILIST_ENDPOINT: &str = "https://graphql.anilist.co";

#[derive(Debug, Clone)]
pub struct AniListClient {
    client: Client,
    endpoint: String,
}

impl AniListClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let user_agent = format!("anicatalog/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build AniList HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one named operation and returns its `data` object.
    pub(crate) async fn post_operation(
        &self,
        operation: Operation,
        variables: &QueryVariables,
    ) -> Result<Value> {
        let body = json!({
            "operationName": operation.name(),
            "query": operation.document(),
            "variables": variables,
        });
        debug!(operation = %operation, variables = %variables.canonical(), "AniList request");

        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("AniList {} request failed", operation))?;

        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .with_context(|| format!("Failed to read AniList {} body", operation))?;
        if !status.is_success() {
            return Err(anyhow!(
                "AniList {} HTTP error (status {}): {}",
                operation,
                status,
                String::from_utf8_lossy(&bytes)
            ));
        }

        let parsed: GraphQlResponse<Value> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse AniList {} JSON", operation))?;
        unwrap_data(operation, parsed)
    }
}

fn unwrap_data(operation: Operation, parsed: GraphQlResponse<Value>) -> Result<Value> {
    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        return Err(anyhow!(
            "AniList {} GraphQL error: {}",
            operation,
            join_errors(errors)
        ));
    }
    parsed
        .data
        .filter(|d| !d.is_null())
        .ok_or_else(|| anyhow!("AniList {} returned no data", operation))
}

fn join_errors(errors: Vec<GraphQlError>) -> String {
    errors
        .into_iter()
        .map(|e| match e.status {
            Some(s) => format!("{} (status {})", e.message, s),
            None => e.message,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

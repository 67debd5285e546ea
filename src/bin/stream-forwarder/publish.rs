use async_trait::async_trait;
use derive_builder::Builder;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::error::PublishFailure;
use crate::stream::Message;

pub const PUBLISH_MESSAGE: &str = "mutation PublishMessage($id: ID!, $body: String!) {
  publishMessage(message: {id: $id, body: $body}) {
    id
    body
  }
}";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Mutation<'a> {
    query: &'static str,
    operation_name: &'static str,
    variables: &'a Message,
}

impl<'a> Mutation<'a> {
    const fn publish_message(message: &'a Message) -> Self {
        Self {
            query: PUBLISH_MESSAGE,
            operation_name: "PublishMessage",
            variables: message,
        }
    }
}

/// Sends one PublishMessage mutation per call.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the response document on any 2xx, GraphQL errors included.
    async fn publish(&self, credential: &str, message: &Message) -> Result<Value, PublishFailure>;
}

/// Posts mutations to an AppSync GraphQL endpoint using API key auth.
#[derive(Builder, Debug)]
#[builder(setter(into))]
pub struct AppSyncPublisher {
    endpoint: Url,
    #[builder(default)]
    http_client: reqwest::Client,
}

#[async_trait]
impl Publisher for AppSyncPublisher {
    async fn publish(&self, credential: &str, message: &Message) -> Result<Value, PublishFailure> {
        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .header("x-api-key", credential)
            .json(&Mutation::publish_message(message))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(PublishFailure::Status { status, body });
        }

        let data: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));

        if let Some(errors) = data
            .get("errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty())
        {
            let errors = serde_json::to_string(errors).unwrap_or_default();
            warn!(id = %message.id, "GraphQL errors in response: {}", errors);
        }

        info!("{}", data);

        Ok(data)
    }
}

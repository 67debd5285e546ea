use std::fmt;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::ForwardError;

/// Where API keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Returns the first active key of the API, if it has any.
    async fn first_key(&self, api_id: &str) -> Result<Option<String>>;
}

/// Looks keys up through the AppSync management API.
#[derive(Clone, Debug)]
pub struct AppSyncKeys {
    client: aws_sdk_appsync::Client,
}

impl AppSyncKeys {
    pub fn new(client: aws_sdk_appsync::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeySource for AppSyncKeys {
    async fn first_key(&self, api_id: &str) -> Result<Option<String>> {
        let output = self
            .client
            .list_api_keys()
            .api_id(api_id)
            .max_results(1)
            .send()
            .await
            .with_context(|| format!("ListApiKeys failed for API {}", api_id))?;

        Ok(output
            .api_keys()
            .unwrap_or_default()
            .first()
            .and_then(|key| key.id())
            .map(String::from))
    }
}

/// Per-process state shared by every invocation: the API key, resolved once.
///
/// A failed resolution leaves the session empty, so the next invocation
/// tries again. Once set, the key is kept until the process is recycled.
#[derive(Default)]
pub struct Session {
    credential: OnceCell<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Session {
    /// A session seeded with a known key; no lookup will ever happen.
    pub fn with_credential(key: impl Into<String>) -> Self {
        Self {
            credential: OnceCell::new_with(Some(key.into())),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.credential.initialized()
    }

    pub async fn credential<K>(&self, keys: &K, api_id: &str) -> Result<&str, ForwardError>
    where
        K: KeySource + ?Sized,
    {
        self.credential
            .get_or_try_init(|| async {
                info!(api_id, "Loading API key");
                match keys.first_key(api_id).await {
                    Ok(Some(key)) => {
                        info!(api_id, "API key loaded");
                        Ok(key)
                    }
                    Ok(None) => {
                        error!(api_id, "Could not load API key: no keys returned");
                        Err(ForwardError::CredentialUnavailable {
                            api_id: api_id.to_string(),
                            source: None,
                        })
                    }
                    Err(e) => {
                        error!(api_id, "Could not load API key: {:?}", e);
                        Err(ForwardError::CredentialUnavailable {
                            api_id: api_id.to_string(),
                            source: Some(e.into()),
                        })
                    }
                }
            })
            .await
            .map(String::as_str)
    }
}

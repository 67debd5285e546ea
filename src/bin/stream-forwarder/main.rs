#![deny(clippy::all)]
#![deny(nonstandard_style, rust_2018_idioms)]

use std::sync::Arc;

use aws_config::meta::region::RegionProviderChain;
use aws_sdk_appsync::Region;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod forwarder;
mod publish;
mod session;
mod stream;

use config::Config;
use forwarder::ForwarderBuilder;
use publish::AppSyncPublisherBuilder;
use session::{AppSyncKeys, Session};
use stream::StreamEvent;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // CloudWatch adds the ingestion time
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    info!(
        api_id = %config.api_id,
        endpoint = %config.endpoint,
        failure_policy = %config.failure_policy,
        "Starting stream forwarder"
    );

    let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
        .or_default_provider()
        .or_else("us-east-1");
    let sdk_config = aws_config::from_env().region(region).load().await;

    let http_client = Client::builder()
        .user_agent("stream-forwarder")
        .timeout(config.publish_timeout)
        .build()?;

    let session = match &config.api_key {
        Some(key) => Session::with_credential(key.as_str()),
        None => Session::default(),
    };

    let forwarder = ForwarderBuilder::default()
        .api_id(config.api_id.as_str())
        .failure_policy(config.failure_policy)
        .session(session)
        .key_source(AppSyncKeys::new(aws_sdk_appsync::Client::new(&sdk_config)))
        .publisher(
            AppSyncPublisherBuilder::default()
                .endpoint(config.endpoint.clone())
                .http_client(http_client)
                .build()?,
        )
        .build()?;
    let forwarder = Arc::new(forwarder);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<StreamEvent>| {
        let forwarder = Arc::clone(&forwarder);
        async move {
            forwarder.handle(event.payload).await.map_err(|e| {
                error!("{:?}", e); // log error chain to CloudWatch
                Error::from(e)
            })
        }
    }))
    .await
}

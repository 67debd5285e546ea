use derive_builder::Builder;
use serde::Serialize;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::FailurePolicy;
use crate::error::ForwardError;
use crate::publish::Publisher;
use crate::session::{KeySource, Session};
use crate::stream::{insertions, ChangeRecord, StreamEvent};

#[derive(Serialize, PartialEq, Eq, Debug)]
pub struct Output {
    pub message: String,
}

/// Everything an invocation needs, built once per process.
#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Forwarder<K, P> {
    #[builder(setter(into))]
    api_id: String,
    #[builder(default)]
    failure_policy: FailurePolicy,
    #[builder(default)]
    session: Session,
    key_source: K,
    publisher: P,
}

impl<K, P> Forwarder<K, P>
where
    K: KeySource,
    P: Publisher,
{
    /// Publishes every insert of the batch in delivery order.
    ///
    /// The returned count is the batch size, not the number of published
    /// messages. With [`FailurePolicy::Abort`] the first failed publish ends
    /// the invocation and later records are never attempted.
    pub async fn handle(&self, event: StreamEvent) -> Result<Output, ForwardError> {
        let total = event.records.len();

        info!(records = total, "Processing stream batch");

        let credential = self
            .session
            .credential(&self.key_source, &self.api_id)
            .await?;

        let mut inserts = 0;
        let mut published = 0;
        for (index, record) in insertions(&event.records) {
            inserts += 1;
            let span = info_span!(
                "record",
                index,
                event_id = record.event_id.as_deref().unwrap_or_default()
            );
            if self.forward(index, record, credential).instrument(span).await? {
                published += 1;
            }
        }

        debug!(
            total,
            published,
            failed = inserts - published,
            skipped = total - inserts,
            "Batch done"
        );

        Ok(Output {
            message: format!("Finished processing {} records", total),
        })
    }

    /// Returns whether the record was published.
    async fn forward(
        &self,
        index: usize,
        record: &ChangeRecord,
        credential: &str,
    ) -> Result<bool, ForwardError> {
        let message = record.message(index)?;

        debug!(id = %message.id, "Publishing message");

        match self.publisher.publish(credential, &message).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!(id = %message.id, policy = %self.failure_policy, "{}", e);
                match self.failure_policy {
                    FailurePolicy::Abort => Err(ForwardError::PublishFailed {
                        id: message.id,
                        source: e,
                    }),
                    FailurePolicy::Continue => Ok(false),
                }
            }
        }
    }
}

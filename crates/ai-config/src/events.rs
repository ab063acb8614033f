//! [`EventReporter`] that batches served-variant events to the AI-config
//! service.
//!
//! `record` appends to an in-memory buffer; `flush` drains the buffer and
//! posts it as one JSON array to `{base_url}/v1/events`. A failed flush drops
//! the batch: experiment attribution is best effort and never blocks a run.

use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{ConfigServedEvent, EventReporter, ReportError};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::AiConfigSettings;

/// Buffers events and delivers them on [`EventReporter::flush`].
#[derive(Debug)]
pub struct HttpEventReporter {
    client: reqwest::Client,
    settings: AiConfigSettings,
    buffer: Mutex<Vec<ConfigServedEvent>>,
}

impl HttpEventReporter {
    /// Creates a reporter for `settings`.
    pub fn new(settings: AiConfigSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            buffer: Mutex::new(Vec::new()),
        }
    }

    fn take_batch(&self) -> Vec<ConfigServedEvent> {
        match self.buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl EventReporter for HttpEventReporter {
    fn record(&self, event: ConfigServedEvent) {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    async fn flush(&self) -> Result<(), ReportError> {
        let batch = self.take_batch();
        if batch.is_empty() {
            return Ok(());
        }

        let url = format!("{}/v1/events", self.settings.base_url);
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.settings.sdk_key.expose_secret(),
            )
            .timeout(self.settings.timeout)
            .json(&batch)
            .send()
            .await
            .map_err(|e| {
                warn!(dropped = batch.len(), error = %e, "Event delivery failed");
                ReportError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(dropped = batch.len(), status = status.as_u16(), "Event batch rejected");
            return Err(ReportError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(delivered = batch.len(), "Event batch delivered");
        Ok(())
    }
}

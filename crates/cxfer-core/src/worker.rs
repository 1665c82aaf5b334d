//! Per-resource transfer
//!
//! A transfer is two steps: submit the resource, then poll the destination
//! with exponential backoff until it reports the transfer finished.
//!
//! # Failure semantics
//!
//! - Validation rejections fail immediately and are never retried.
//! - Server errors on submission are retried only as far as the
//!   [`SubmitPolicy`] allows (one attempt by default).
//! - A malformed, not-yet-visible or 5xx status is a miss, not a failure.
//! - Exhausting the poll attempts fails with a timeout.

use crate::config::{PollPolicy, SubmitPolicy};
use crate::error::{RegistryError, TransferError, TransferErrorKind};
use crate::registry::DestinationRegistry;
use crate::types::Resource;
use std::sync::Arc;
use tokio::time::sleep;

/// Attempts spent on a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Submissions made, including the accepted one
    pub submit_attempts: u32,
    /// Status fetches made, including the one reporting completion
    pub poll_attempts: u32,
}

/// Transfers single resources to the destination registry
///
/// Cheap to clone; clones share the destination client.
#[derive(Clone)]
pub struct TransferWorker {
    destination: Arc<dyn DestinationRegistry>,
    poll: PollPolicy,
    submit: SubmitPolicy,
}

impl std::fmt::Debug for TransferWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferWorker")
            .field("poll", &self.poll)
            .field("submit", &self.submit)
            .finish_non_exhaustive()
    }
}

impl TransferWorker {
    /// Create worker with default policies
    #[inline]
    #[must_use]
    pub fn new(destination: Arc<dyn DestinationRegistry>) -> Self {
        Self {
            destination,
            poll: PollPolicy::default(),
            submit: SubmitPolicy::default(),
        }
    }

    /// With polling policy
    #[inline]
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// With submission policy
    #[inline]
    #[must_use]
    pub fn with_submit_policy(mut self, submit: SubmitPolicy) -> Self {
        self.submit = submit;
        self
    }

    /// Transfer one resource and wait for the destination to finish it
    ///
    /// # Errors
    /// - `Validation` if the destination rejects the resource
    /// - `Server` if submission keeps failing server-side
    /// - `Networking` on transport failures
    /// - `Timeout` if completion is not observed within the poll budget
    pub async fn transfer(&self, resource: &Resource) -> Result<TransferReceipt, TransferError> {
        let submit_attempts = self.submit(resource).await?;
        let poll_attempts = self.await_completion(resource).await?;

        tracing::info!(
            id = %resource.id,
            resource_type = %resource.resource_type,
            poll_attempts,
            "resource transferred"
        );

        Ok(TransferReceipt {
            submit_attempts,
            poll_attempts,
        })
    }

    /// Submit, retrying server-side failures within the policy
    async fn submit(&self, resource: &Resource) -> Result<u32, TransferError> {
        let max_attempts = self.submit.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.destination.submit_transfer(resource).await {
                Ok(()) => {
                    tracing::debug!(id = %resource.id, attempt, "transfer initiated");
                    return Ok(attempt);
                }
                Err(RegistryError::Server(message)) if attempt < max_attempts => {
                    tracing::warn!(
                        id = %resource.id,
                        attempt,
                        error = %message,
                        "server error on submission, retrying"
                    );
                    sleep(self.submit.retry_delay()).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(TransferError::from_registry(
                        resource.id.clone(),
                        resource.resource_type,
                        &error,
                    ));
                }
            }
        }
    }

    /// Poll until finished, doubling the delay after each miss
    async fn await_completion(&self, resource: &Resource) -> Result<u32, TransferError> {
        for attempt in 0..self.poll.max_attempts {
            match self
                .destination
                .fetch_status(resource.resource_type, &resource.id)
                .await
            {
                Ok(status) if status.finished => return Ok(attempt + 1),
                Ok(_) => {
                    tracing::trace!(id = %resource.id, attempt, "transfer pending");
                }
                Err(error) if error.is_transient_miss() => {
                    tracing::debug!(id = %resource.id, attempt, %error, "status unreadable");
                }
                Err(error) => {
                    return Err(TransferError::from_registry(
                        resource.id.clone(),
                        resource.resource_type,
                        &error,
                    ));
                }
            }

            let delay = self.poll.delay_for_attempt(attempt);
            tracing::trace!(id = %resource.id, attempt, ?delay, "backing off");
            sleep(delay).await;
        }

        Err(TransferError::new(
            resource.id.clone(),
            resource.resource_type,
            TransferErrorKind::Timeout,
            format!(
                "unable to validate resource transfer after {} attempts",
                self.poll.max_attempts
            ),
        ))
    }
}

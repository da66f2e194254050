//! Routing and fan-out: one conversation in, one normalized outcome per
//! requested model out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::DispatchError;
use crate::identifier::ModelRef;
use crate::models::message::Message;
use crate::providers::base::{Completion, Provider};
use crate::providers::factory::{self, ProviderType};

/// Per-call budget used when the caller does not supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of a single model call. Failures are values; the caller decides
/// whether a partial set of answers is acceptable.
pub type QueryResult = Result<Completion, DispatchError>;

type SharedProvider = Arc<dyn Provider>;
type Slot = OnceCell<Result<SharedProvider, DispatchError>>;

/// Routes model identifiers to backend adapters and fans calls out.
///
/// One instance holds the process-wide provider handles. Each backend is
/// constructed on first use (the cell makes concurrent first calls race-free)
/// and the slot is read-only afterwards. A construction failure, such as a
/// missing credential, is kept in the slot and returned for every later call
/// to that backend.
pub struct Dispatcher {
    openai: Slot,
    anthropic: Slot,
    google: Slot,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            openai: OnceCell::new(),
            anthropic: OnceCell::new(),
            google: OnceCell::new(),
        }
    }

    fn slot(&self, kind: ProviderType) -> &Slot {
        match kind {
            ProviderType::OpenAi => &self.openai,
            ProviderType::Anthropic => &self.anthropic,
            ProviderType::Google => &self.google,
        }
    }

    async fn provider(&self, kind: ProviderType) -> Result<SharedProvider, DispatchError> {
        self.slot(kind)
            .get_or_init(|| async move { factory::get_provider(kind).map(Arc::from) })
            .await
            .clone()
    }

    /// Send a conversation to one model and normalize the outcome.
    ///
    /// Malformed identifiers and unknown provider tags fail here without
    /// touching any adapter or the network. Adapter errors of every kind
    /// come back as [`DispatchError::Provider`] values; expiry of `timeout`
    /// becomes [`DispatchError::Timeout`]. Nothing propagates as a panic.
    pub async fn dispatch(
        &self,
        identifier: &str,
        conversation: &[Message],
        timeout: Duration,
    ) -> QueryResult {
        let model = ModelRef::parse(identifier)?;

        let Some(kind) = ProviderType::from_tag(model.provider) else {
            return Err(DispatchError::UnknownProvider(model.provider.to_string()));
        };

        let provider = self.provider(kind).await?;

        debug!(model = identifier, "dispatching");
        match tokio::time::timeout(timeout, provider.complete(model.model, conversation, timeout))
            .await
        {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => {
                warn!(model = identifier, error = %e, "provider call failed");
                Err(DispatchError::Provider(e.to_string()))
            }
            Err(_) => {
                warn!(model = identifier, timeout_s = timeout.as_secs(), "call timed out");
                Err(DispatchError::Timeout(timeout))
            }
        }
    }

    /// Query every identifier concurrently with the default budget.
    ///
    /// All calls start together and the join waits for every one of them to
    /// reach a terminal outcome; a failed or expired call lands in its own
    /// slot without cancelling or delaying siblings. The mapping zips input
    /// order with outcomes, so a duplicated identifier keeps the later
    /// entry's outcome.
    pub async fn dispatch_all(
        &self,
        identifiers: &[String],
        conversation: &[Message],
    ) -> HashMap<String, QueryResult> {
        let calls = identifiers
            .iter()
            .map(|identifier| self.dispatch(identifier, conversation, DEFAULT_TIMEOUT));

        let outcomes = futures::future::join_all(calls).await;

        identifiers.iter().cloned().zip(outcomes).collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

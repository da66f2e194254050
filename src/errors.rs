use std::time::Duration;
use thiserror::Error;

/// Failure of a single model call, surfaced as a value by the dispatcher.
///
/// Nothing crosses the dispatch boundary as a panic or a raw transport
/// error; every way a call can go wrong collapses into one of these
/// variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("malformed model identifier '{0}': expected 'provider:model_name'")]
    MalformedIdentifier(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("{0} environment variable is not set")]
    MissingCredential(String),

    #[error("provider call failed: {0}")]
    Provider(String),

    #[error("call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

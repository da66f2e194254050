use strum_macros::EnumIter;

use super::{
    anthropic::AnthropicProvider,
    base::Provider,
    configs::{AnthropicProviderConfig, GoogleProviderConfig, OpenAiProviderConfig},
    google::GoogleProvider,
    openai::OpenAiProvider,
};
use crate::errors::DispatchError;

/// The closed set of supported backends. Routing is an exhaustive match on
/// this enum, so wiring up a new backend is a compile-visible change, not a
/// string comparison that can silently fall through.
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderType {
    /// Look up a provider tag parsed from a model identifier. `None` for
    /// anything outside the fixed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "openai" => Some(ProviderType::OpenAi),
            "anthropic" => Some(ProviderType::Anthropic),
            "google" => Some(ProviderType::Google),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Google => "google",
        }
    }
}

/// Construct the adapter for a backend from its environment configuration.
pub fn get_provider(kind: ProviderType) -> Result<Box<dyn Provider>, DispatchError> {
    match kind {
        ProviderType::OpenAi => Ok(Box::new(OpenAiProvider::new(
            OpenAiProviderConfig::from_env()?,
        )?)),
        ProviderType::Anthropic => Ok(Box::new(AnthropicProvider::new(
            AnthropicProviderConfig::from_env()?,
        )?)),
        ProviderType::Google => Ok(Box::new(GoogleProvider::new(
            GoogleProviderConfig::from_env()?,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tags_round_trip() {
        for kind in ProviderType::iter() {
            assert_eq!(ProviderType::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert_eq!(ProviderType::from_tag("mistral"), None);
        assert_eq!(ProviderType::from_tag("OpenAI"), None);
        assert_eq!(ProviderType::from_tag(""), None);
    }
}

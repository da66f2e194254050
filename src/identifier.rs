use crate::errors::DispatchError;

/// A `provider:model_name` reference split into its two halves.
///
/// Only the first `:` separates the tag from the model name, so model names
/// may themselves contain the delimiter (`openai:ft:gpt-4o:custom` keeps
/// `ft:gpt-4o:custom` intact).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRef<'a> {
    pub provider: &'a str,
    pub model: &'a str,
}

impl<'a> ModelRef<'a> {
    /// Split an identifier on its first delimiter.
    ///
    /// Purely syntactic: the tag is not checked against the provider
    /// registry here, that happens at dispatch time.
    pub fn parse(identifier: &'a str) -> Result<Self, DispatchError> {
        match identifier.split_once(':') {
            Some((provider, model)) => Ok(ModelRef { provider, model }),
            None => Err(DispatchError::MalformedIdentifier(identifier.to_string())),
        }
    }
}

//! The conversation model passed between callers and providers.
//!
//! Each backend speaks its own wire format: OpenAI takes one role-tagged
//! list, Anthropic splits the system instruction out of the turn list, and
//! Google's generate call takes a single flattened prompt. We keep one
//! internal shape and convert at each adapter boundary, so none of those
//! formats leak into callers.
pub mod message;

//! Recipient and message validation
//!
//! Recipients must be in international format: a leading `+` followed by at
//! least one ASCII digit and nothing else. Messages must be non-empty and no
//! longer than the configured maximum, counted in characters.

use thiserror::Error;

use crate::config::ValidationConfig;

/// Reason a recipient/message pair was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Recipient is empty
    #[error("recipient is empty")]
    EmptyRecipient,
    /// Recipient does not start with `+`
    #[error("recipient must start with '+'")]
    MissingPrefix,
    /// Recipient has no digits, or a non-digit after the prefix
    #[error("recipient must contain only digits after '+'")]
    NonDigit,
    /// Message is empty
    #[error("message is empty")]
    EmptyMessage,
    /// Message exceeds the maximum length
    #[error("message is {len} characters, maximum is {max}")]
    MessageTooLong {
        /// Actual length in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Pure recipient/message validator
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_message_length: usize,
}

impl Validator {
    /// Create a validator with the given maximum message length
    #[must_use]
    pub fn new(max_message_length: usize) -> Self {
        Self { max_message_length }
    }

    /// Create a validator from configuration
    #[must_use]
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.max_message_length)
    }

    /// Check a recipient/message pair, naming the first rule that fails.
    pub fn check(&self, recipient: &str, message: &str) -> Result<(), ValidationError> {
        if recipient.is_empty() {
            return Err(ValidationError::EmptyRecipient);
        }
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        let len = message.chars().count();
        if len > self.max_message_length {
            return Err(ValidationError::MessageTooLong {
                len,
                max: self.max_message_length,
            });
        }

        let Some(digits) = recipient.strip_prefix('+') else {
            return Err(ValidationError::MissingPrefix);
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::NonDigit);
        }

        Ok(())
    }

    /// Whether the recipient/message pair is acceptable
    #[must_use]
    pub fn validate(&self, recipient: &str, message: &str) -> bool {
        self.check(recipient, message).is_ok()
    }
}

/// Normalize a raw recipient: trim whitespace and prepend `+` when missing.
///
/// This is the only place a `+` is ever added. An empty input stays empty so
/// the validator still rejects it.
#[must_use]
pub fn normalize_recipient(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    }
}

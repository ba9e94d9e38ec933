//! Accumulator for validation error messages.
//!
//! A request is validated field by field; every failure is appended to one
//! `ValidationResult` so the caller gets a single aggregated report instead
//! of the first error found.

/// Ordered collection of validation error messages.
///
/// The result is "valid" iff no messages were appended. Empty and
/// whitespace-only messages are ignored by `append`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    messages: Vec<String>,
}

impl ValidationResult {
    /// Create a result with no errors.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Create a result that already carries one error message.
    pub fn with_error(message: impl Into<String>) -> Self {
        let mut result = Self::default();
        result.append(message);
        result
    }

    /// Append an error message, ignoring empty or whitespace-only input.
    pub fn append(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.trim().is_empty() {
            self.messages.push(message);
        }
    }

    /// Fold another result's messages into this one, preserving order.
    pub fn merge(&mut self, other: ValidationResult) {
        for message in other.messages {
            self.append(message);
        }
    }

    /// `true` iff no error message has been collected.
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// All collected messages joined with `"; "`.
    pub fn message(&self) -> String {
        self.messages.join("; ")
    }

    /// The individual messages, in append order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

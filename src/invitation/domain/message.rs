//! Invitation message text.

use super::InvitationDomainError;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for an invitation message.
const MAX_MESSAGE_LENGTH: usize = 500;

/// Template used when the inviter does not supply a message.
const DEFAULT_MESSAGE_TEMPLATE: &str = "You've been invited to join {{ project_name }}";

/// Trimmed invitation message of at most 500 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvitationMessage(String);

impl InvitationMessage {
    /// Creates a validated message.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::MessageTooLong`] when the trimmed
    /// value exceeds 500 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, InvitationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(InvitationDomainError::MessageTooLong {
                max: MAX_MESSAGE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Renders the default message naming the project.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::MessageTemplate`] when rendering
    /// fails, or [`InvitationDomainError::MessageTooLong`] when the rendered
    /// text exceeds the length limit.
    pub fn default_for(project_name: &str) -> Result<Self, InvitationDomainError> {
        let env = Environment::new();
        let rendered = env
            .render_str(DEFAULT_MESSAGE_TEMPLATE, context! { project_name })
            .map_err(|err| InvitationDomainError::MessageTemplate(err.to_string()))?;
        Self::new(rendered)
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvitationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Validated project text fields.

use super::ProjectDomainError;
use serde::Serialize;
use std::fmt;

/// Maximum length for a project name, matching the `VARCHAR(100)` column.
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for a project description.
const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Trimmed, non-empty project name of at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a validated project name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProjectName`] when the value is
    /// empty after trimming, or [`ProjectDomainError::ProjectNameTooLong`]
    /// when it exceeds 100 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyProjectName);
        }
        let length = trimmed.chars().count();
        if length > MAX_NAME_LENGTH {
            return Err(ProjectDomainError::ProjectNameTooLong {
                max: MAX_NAME_LENGTH,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trimmed project description of at most 500 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectDescription(String);

impl ProjectDescription {
    /// Creates a validated description.
    ///
    /// Returns `Ok(None)` when the value is blank.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::DescriptionTooLong`] when the trimmed
    /// value exceeds 500 characters.
    pub fn new(value: impl Into<String>) -> Result<Option<Self>, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let length = trimmed.chars().count();
        if length > MAX_DESCRIPTION_LENGTH {
            return Err(ProjectDomainError::DescriptionTooLong {
                max: MAX_DESCRIPTION_LENGTH,
                actual: length,
            });
        }
        Ok(Some(Self(trimmed.to_owned())))
    }

    /// Returns the description as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectDescription {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

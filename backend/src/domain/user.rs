//! Platform users: students, instructors, and administrators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Email address is empty or malformed.
    #[error("email address must look like name@domain.tld")]
    InvalidEmail,
    /// Identity-provider id is empty.
    #[error("external user id must not be empty")]
    EmptyExternalId,
    /// Role string is not recognised.
    #[error("role must be one of STUDENT, INSTRUCTOR, ADMIN")]
    UnknownRole,
}

/// Role a user plays on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Learner; the default for new accounts.
    #[default]
    Student,
    /// Course author.
    Instructor,
    /// Platform operator.
    Admin,
}

impl UserRole {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Instructor => "INSTRUCTOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "INSTRUCTOR" => Ok(Self::Instructor),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Normalised (trimmed, lower-case) email address.
///
/// # Examples
/// ```
/// use academy_backend::domain::EmailAddress;
///
/// let email = EmailAddress::new(" Ada@Example.COM ").expect("valid email");
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert!(EmailAddress::new("not-an-email").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        let (local, domain) = normalised
            .split_once('@')
            .ok_or(UserValidationError::InvalidEmail)?;
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// A platform account mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: EmailAddress,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields carried by identity-provider events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: EmailAddress,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update applied by administrators or the user themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub role: Option<UserRole>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl User {
    /// Register a new student account from an identity profile.
    pub fn register(profile: IdentityProfile, now: DateTime<Utc>) -> Result<Self, UserValidationError> {
        let external_id = profile.external_id.trim().to_owned();
        if external_id.is_empty() {
            return Err(UserValidationError::EmptyExternalId);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            external_id,
            email: profile.email,
            first_name: non_blank(profile.first_name),
            last_name: non_blank(profile.last_name),
            image_url: non_blank(profile.image_url),
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Merge identity-provider data; absent fields keep their current value.
    pub fn apply_profile(&mut self, profile: IdentityProfile, now: DateTime<Utc>) {
        self.email = profile.email;
        if let Some(first_name) = non_blank(profile.first_name) {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = non_blank(profile.last_name) {
            self.last_name = Some(last_name);
        }
        if let Some(image_url) = non_blank(profile.image_url) {
            self.image_url = Some(image_url);
        }
        self.updated_at = now;
    }

    /// Apply a partial update.
    pub fn apply_update(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        let UserUpdate {
            first_name,
            last_name,
            image_url,
            role,
        } = update;
        if first_name.is_some() {
            self.first_name = non_blank(first_name);
        }
        if last_name.is_some() {
            self.last_name = non_blank(last_name);
        }
        if image_url.is_some() {
            self.image_url = non_blank(image_url);
        }
        if let Some(role) = role {
            self.role = role;
        }
        self.updated_at = now;
    }

    /// Full name for documents and reports, falling back to the email.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            self.email.to_string()
        } else {
            parts.join(" ")
        }
    }

    /// Case-insensitive match over names and email.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
            || self.email.as_str().contains(&needle)
    }
}

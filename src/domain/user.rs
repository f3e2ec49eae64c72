//! User domain entity and related types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Local part accepted in institutional addresses
static EMAIL_LOCAL_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+$").expect("email local-part pattern is valid")
});

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub contact_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration data after validation and password hashing
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub contact_number: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProfileUpdate {
    #[schema(example = "Asha")]
    pub first_name: Option<String>,
    #[schema(example = "Rao")]
    pub last_name: Option<String>,
    #[schema(example = 21)]
    pub age: Option<i32>,
    #[schema(example = "9876543210")]
    pub contact_number: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.contact_number.is_none()
    }

    /// Apply the update in place, touching `updated_at` only on change.
    pub fn apply(self, user: &mut User) {
        if self.is_empty() {
            return;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(contact_number) = self.contact_number {
            user.contact_number = contact_number;
        }
        user.updated_at = Utc::now();
    }
}

/// Normalize and check an institutional email address.
///
/// Domains compare case-insensitively; the address is stored lowercased.
pub fn normalize_institutional_email(email: &str, allowed_domains: &[String]) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| AppError::validation("Invalid email format"))?;

    if local.is_empty() || !EMAIL_LOCAL_PART.is_match(local) {
        return Err(AppError::validation("Invalid email format"));
    }

    if !allowed_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
        return Err(AppError::validation(format!(
            "Only institutional email addresses are allowed ({})",
            allowed_domains.join(", ")
        )));
    }

    Ok(email)
}

/// Own profile (safe to return to the account holder)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Asha")]
    pub first_name: String,
    #[schema(example = "Rao")]
    pub last_name: String,
    #[schema(example = "asha.rao@students.iiit.ac.in")]
    pub email: String,
    #[schema(example = 21)]
    pub age: i32,
    #[schema(example = "9876543210")]
    pub contact_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            contact_number: user.contact_number,
            created_at: user.created_at,
        }
    }
}

/// Contact card shown to other users (seller pages, item detail)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            contact_number: user.contact_number,
        }
    }
}

/// Name-only reference used when resolving buyers, sellers and reviewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PartySummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl PartySummary {
    /// Placeholder for a reference whose user record is gone.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            first_name: "Unknown".to_string(),
            last_name: "user".to_string(),
        }
    }
}

impl From<&User> for PartySummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<String> {
        vec![
            "research.iiit.ac.in".to_string(),
            "students.iiit.ac.in".to_string(),
        ]
    }

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@students.iiit.ac.in".to_string(),
            age: 20,
            contact_number: "123".to_string(),
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_accepts_institutional_domains() {
        let email =
            normalize_institutional_email("Asha.Rao@Students.IIIT.ac.in", &domains()).unwrap();
        assert_eq!(email, "asha.rao@students.iiit.ac.in");
        assert!(normalize_institutional_email("x_y+1@research.iiit.ac.in", &domains()).is_ok());
    }

    #[test]
    fn test_rejects_other_domains() {
        let err = normalize_institutional_email("asha@gmail.com", &domains()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(normalize_institutional_email("asha@iiit.ac.in", &domains()).is_err());
    }

    #[test]
    fn test_rejects_malformed_local_part() {
        assert!(normalize_institutional_email("@students.iiit.ac.in", &domains()).is_err());
        assert!(normalize_institutional_email("a b@students.iiit.ac.in", &domains()).is_err());
        assert!(normalize_institutional_email("no-at-sign", &domains()).is_err());
    }

    #[test]
    fn test_profile_update_applies_only_given_fields() {
        let mut user = sample_user();
        let before = user.updated_at;
        ProfileUpdate {
            age: Some(22),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.age, 22);
        assert_eq!(user.first_name, "Asha");
        assert!(user.updated_at >= before);
    }

    #[test]
    fn test_user_serialization_skips_password_hash() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
    }
}

use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::StoreError;
use crate::validation::{present, EmailRule, TextRule, Violation};

pub const FIRST_NAME: TextRule = TextRule {
    field: "firstName",
    missing: "Your first name is required.",
    empty: "Please provide your first name.",
};

pub const LAST_NAME: TextRule = TextRule {
    field: "lastName",
    missing: "Your last name is required.",
    empty: "Please provide your last name.",
};

pub const EMAIL_ADDRESS: EmailRule = EmailRule {
    field: "emailAddress",
    missing: "Please provide your email address.",
    invalid: "Please use the correct email format: example@email.com",
};

pub const PASSWORD: TextRule = TextRule {
    field: "password",
    missing: "Your password must be at least 8 to 20 characters in length",
    empty: "Your password must be at least 8 to 20 characters in length.",
};

pub const EMAIL_TAKEN: &str = "Email address is already taken. Please provide another one.";

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password: String, // hashed when 8..=20 chars on write
}

/// Registration body. Every field is optional here so a missing key is
/// reported as a field rule rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub password: Option<String>,
}

/// A [`NewUser`] that passed every field rule. `password` is still raw.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(self) -> Result<UserDraft, StoreError> {
        let mut violations = Vec::new();
        let first_name = FIRST_NAME.take(self.first_name, &mut violations);
        let last_name = LAST_NAME.take(self.last_name, &mut violations);
        let email_address = EMAIL_ADDRESS.take(self.email_address, &mut violations);
        let password = PASSWORD.take(self.password, &mut violations);

        match (first_name, last_name, email_address, password) {
            (Some(first_name), Some(last_name), Some(email_address), Some(password))
                if violations.is_empty() =>
            {
                Ok(UserDraft {
                    first_name,
                    last_name,
                    email_address,
                    password,
                })
            }
            _ => Err(StoreError::Validation(violations)),
        }
    }
}

/// Partial update of the authenticated user's own record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub email_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub password: Option<Option<String>>,
}

/// Validated [`UserPatch`]; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn validate(self) -> Result<UserChanges, StoreError> {
        let mut violations: Vec<Violation> = Vec::new();
        let changes = UserChanges {
            first_name: FIRST_NAME.take_patch(self.first_name, &mut violations),
            last_name: LAST_NAME.take_patch(self.last_name, &mut violations),
            email_address: EMAIL_ADDRESS.take_patch(self.email_address, &mut violations),
            password: PASSWORD.take_patch(self.password, &mut violations),
        };
        if violations.is_empty() {
            Ok(changes)
        } else {
            Err(StoreError::Validation(violations))
        }
    }
}

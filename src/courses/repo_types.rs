use serde::Deserialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::StoreError;
use crate::users::repo_types::User;
use crate::validation::{present, TextRule, Violation};

pub const TITLE: TextRule = TextRule {
    field: "title",
    missing: "Title is required.",
    empty: "Please provide a course title.",
};

pub const DESCRIPTION: TextRule = TextRule {
    field: "description",
    missing: "Description is required",
    empty: "Please provide a course description.",
};

pub const USER_ID_MISSING: &str = "Please provide a user's ID to userId.";
pub const USER_ID_UNKNOWN: &str = "Please provide the ID of an existing user to userId.";

/// Course record in the database. `user_id` references `users.id`.
#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A course joined with its owner.
#[derive(Debug, Clone)]
pub struct CourseWithOwner {
    pub course: Course,
    pub owner: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: Uuid,
}

impl NewCourse {
    pub fn validate(self) -> Result<CourseDraft, StoreError> {
        let mut violations = Vec::new();
        let title = TITLE.take(self.title, &mut violations);
        let description = DESCRIPTION.take(self.description, &mut violations);
        if self.user_id.is_none() {
            violations.push(Violation::new("userId", USER_ID_MISSING));
        }

        match (title, description, self.user_id) {
            (Some(title), Some(description), Some(user_id)) if violations.is_empty() => {
                Ok(CourseDraft {
                    title,
                    description,
                    estimated_time: self.estimated_time,
                    materials_needed: self.materials_needed,
                    user_id,
                })
            }
            _ => Err(StoreError::Validation(violations)),
        }
    }
}

/// Partial course update. Ownership cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub estimated_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub materials_needed: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub estimated_time: Option<Option<String>>,
    pub materials_needed: Option<Option<String>>,
}

impl CoursePatch {
    pub fn validate(self) -> Result<CourseChanges, StoreError> {
        let mut violations = Vec::new();
        let changes = CourseChanges {
            title: TITLE.take_patch(self.title, &mut violations),
            description: DESCRIPTION.take_patch(self.description, &mut violations),
            estimated_time: self.estimated_time,
            materials_needed: self.materials_needed,
        };
        if violations.is_empty() {
            Ok(changes)
        } else {
            Err(StoreError::Validation(violations))
        }
    }
}

impl CourseChanges {
    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(estimated_time) = self.estimated_time {
            course.estimated_time = estimated_time;
        }
        if let Some(materials_needed) = self.materials_needed {
            course.materials_needed = materials_needed;
        }
    }
}

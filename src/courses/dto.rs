use serde::Serialize;
use uuid::Uuid;

use super::repo_types::CourseWithOwner;
use crate::users::dto::PublicUser;

/// A course as returned to clients, with its owner's public fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: Uuid,
    pub user: PublicUser,
}

impl From<CourseWithOwner> for CourseDetails {
    fn from(CourseWithOwner { course, owner }: CourseWithOwner) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            estimated_time: course.estimated_time,
            materials_needed: course.materials_needed,
            user_id: course.user_id,
            user: owner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseDetails>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub course: CourseDetails,
}

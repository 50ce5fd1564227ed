//! Persistence ports for users and courses.
//!
//! Both stores validate input against the field rules before writing and
//! run raw passwords through [`PasswordPolicy::prepare`](crate::auth::password::PasswordPolicy::prepare),
//! so every backend yields the same errors for the same input.

use async_trait::async_trait;
use uuid::Uuid;

use crate::courses::repo_types::{Course, CoursePatch, CourseWithOwner, NewCourse};
use crate::users::repo_types::{NewUser, User, UserPatch};
use crate::validation::Violation;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// One or more field rules failed; nothing was written.
    #[error("validation failed: {0:?}")]
    Validation(Vec<Violation>),

    #[error("unique constraint violated: {0:?}")]
    UniqueConstraint(Vec<Violation>),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact match on `email_address`.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError>;
    /// `Ok(None)` when no user has this id.
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Every course with its owner, oldest first.
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>, StoreError>;
    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError>;
    async fn find_course_with_owner(&self, id: Uuid)
        -> Result<Option<CourseWithOwner>, StoreError>;
    async fn create_course(&self, input: NewCourse) -> Result<Course, StoreError>;
    /// `Ok(None)` when the course disappeared before the write.
    async fn update_course(&self, id: Uuid, patch: CoursePatch)
        -> Result<Option<Course>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError>;
}

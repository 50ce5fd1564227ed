use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{CourseStore, StoreError, UserStore};
use crate::auth::password::PasswordPolicy;
use crate::courses::repo_types::{
    Course, CoursePatch, CourseWithOwner, NewCourse, USER_ID_UNKNOWN,
};
use crate::users::repo_types::{NewUser, User, UserPatch, EMAIL_TAKEN};
use crate::validation::Violation;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_address_key";
const COURSE_OWNER_FK: &str = "courses_user_id_fkey";

/// Postgres-backed user and course store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    passwords: PasswordPolicy,
}

impl PgStore {
    pub fn new(db: PgPool, passwords: PasswordPolicy) -> Self {
        Self { db, passwords }
    }
}

/// Maps constraint failures the client can fix onto field violations.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
            return StoreError::UniqueConstraint(vec![Violation::new("emailAddress", EMAIL_TAKEN)]);
        }
        if db.is_foreign_key_violation() && db.constraint() == Some(COURSE_OWNER_FK) {
            return StoreError::Validation(vec![Violation::new("userId", USER_ID_UNKNOWN)]);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email_address, password
            FROM users
            WHERE email_address = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email_address, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        let draft = input.validate()?;
        let password = self.passwords.prepare(draft.password).await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email_address, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email_address, password
            "#,
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email_address)
        .bind(&password)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let changes = patch.validate()?;
        let password = match changes.password {
            Some(raw) => Some(self.passwords.prepare(raw).await?),
            None => None,
        };
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET first_name    = COALESCE($2, first_name),
                   last_name     = COALESCE($3, last_name),
                   email_address = COALESCE($4, email_address),
                   password      = COALESCE($5, password),
                   updated_at    = now()
             WHERE id = $1
            RETURNING id, first_name, last_name, email_address, password
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email_address)
        .bind(password)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(user)
    }
}

/// Flat row for the course/owner join.
#[derive(Debug, FromRow)]
struct CourseOwnerRow {
    id: Uuid,
    title: String,
    description: String,
    estimated_time: Option<String>,
    materials_needed: Option<String>,
    user_id: Uuid,
    created_at: OffsetDateTime,
    owner_first_name: String,
    owner_last_name: String,
    owner_email_address: String,
    owner_password: String,
}

impl From<CourseOwnerRow> for CourseWithOwner {
    fn from(r: CourseOwnerRow) -> Self {
        Self {
            owner: User {
                id: r.user_id,
                first_name: r.owner_first_name,
                last_name: r.owner_last_name,
                email_address: r.owner_email_address,
                password: r.owner_password,
            },
            course: Course {
                id: r.id,
                title: r.title,
                description: r.description,
                estimated_time: r.estimated_time,
                materials_needed: r.materials_needed,
                user_id: r.user_id,
                created_at: r.created_at,
            },
        }
    }
}

const COURSE_WITH_OWNER_SELECT: &str = r#"
    SELECT c.id, c.title, c.description, c.estimated_time, c.materials_needed, c.user_id,
           c.created_at,
           u.first_name    AS owner_first_name,
           u.last_name     AS owner_last_name,
           u.email_address AS owner_email_address,
           u.password      AS owner_password
    FROM courses c
    JOIN users u ON u.id = c.user_id
"#;

#[async_trait]
impl CourseStore for PgStore {
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>, StoreError> {
        let rows = sqlx::query_as::<_, CourseOwnerRow>(&format!(
            "{COURSE_WITH_OWNER_SELECT} ORDER BY c.created_at ASC, c.id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, estimated_time, materials_needed, user_id,
                   created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(course)
    }

    async fn find_course_with_owner(
        &self,
        id: Uuid,
    ) -> Result<Option<CourseWithOwner>, StoreError> {
        let row = sqlx::query_as::<_, CourseOwnerRow>(&format!(
            "{COURSE_WITH_OWNER_SELECT} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create_course(&self, input: NewCourse) -> Result<Course, StoreError> {
        let draft = input.validate()?;
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, estimated_time, materials_needed, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, estimated_time, materials_needed, user_id,
                      created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.estimated_time)
        .bind(&draft.materials_needed)
        .bind(draft.user_id)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        debug!(course_id = %course.id, user_id = %course.user_id, "course row inserted");
        Ok(course)
    }

    async fn update_course(
        &self,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Option<Course>, StoreError> {
        let changes = patch.validate()?;
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
               SET title            = COALESCE($2, title),
                   description      = COALESCE($3, description),
                   estimated_time   = CASE WHEN $4::boolean THEN $5::text ELSE estimated_time END,
                   materials_needed = CASE WHEN $6::boolean THEN $7::text ELSE materials_needed END,
                   updated_at       = now()
             WHERE id = $1
            RETURNING id, title, description, estimated_time, materials_needed, user_id,
                      created_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.estimated_time.is_some())
        .bind(changes.estimated_time.flatten())
        .bind(changes.materials_needed.is_some())
        .bind(changes.materials_needed.flatten())
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

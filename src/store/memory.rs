//! In-process store with the same rules as the Postgres one. A single
//! `RwLock` over both tables makes each write atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CourseStore, StoreError, UserStore};
use crate::auth::password::PasswordPolicy;
use crate::courses::repo_types::{
    Course, CoursePatch, CourseWithOwner, NewCourse, USER_ID_UNKNOWN,
};
use crate::users::repo_types::{NewUser, User, UserPatch, EMAIL_TAKEN};
use crate::validation::Violation;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    courses: Vec<Course>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email_address == email && Some(u.id) != except)
    }

    fn with_owner(&self, course: &Course) -> Result<CourseWithOwner, StoreError> {
        let owner = self.users.get(&course.user_id).cloned().ok_or_else(|| {
            anyhow::anyhow!("course {} references missing user {}", course.id, course.user_id)
        })?;
        Ok(CourseWithOwner {
            course: course.clone(),
            owner,
        })
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    passwords: PasswordPolicy,
}

impl MemoryStore {
    pub fn new(passwords: PasswordPolicy) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            passwords,
        }
    }
}

fn unique_email() -> StoreError {
    StoreError::UniqueConstraint(vec![Violation::new("emailAddress", EMAIL_TAKEN)])
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email_address == email)
            .cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        let draft = input.validate()?;
        let password = self.passwords.prepare(draft.password).await?;

        let mut tables = self.tables.write().await;
        if tables.email_taken(&draft.email_address, None) {
            return Err(unique_email());
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email_address: draft.email_address,
            password,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let changes = patch.validate()?;
        let password = match changes.password {
            Some(raw) => Some(self.passwords.prepare(raw).await?),
            None => None,
        };

        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email_address {
            if tables.email_taken(email, Some(id)) {
                return Err(unique_email());
            }
        }
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(email_address) = changes.email_address {
            user.email_address = email_address;
        }
        if let Some(password) = password {
            user.password = password;
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn list_courses(&self) -> Result<Vec<CourseWithOwner>, StoreError> {
        let tables = self.tables.read().await;
        let mut courses: Vec<&Course> = tables.courses.iter().collect();
        // stable, so same-instant inserts keep insertion order
        courses.sort_by_key(|c| c.created_at);
        courses.into_iter().map(|c| tables.with_owner(c)).collect()
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn find_course_with_owner(
        &self,
        id: Uuid,
    ) -> Result<Option<CourseWithOwner>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .courses
            .iter()
            .find(|c| c.id == id)
            .map(|c| tables.with_owner(c))
            .transpose()
    }

    async fn create_course(&self, input: NewCourse) -> Result<Course, StoreError> {
        let draft = input.validate()?;

        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&draft.user_id) {
            return Err(StoreError::Validation(vec![Violation::new(
                "userId",
                USER_ID_UNKNOWN,
            )]));
        }
        let course = Course {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            estimated_time: draft.estimated_time,
            materials_needed: draft.materials_needed,
            user_id: draft.user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Option<Course>, StoreError> {
        let changes = patch.validate()?;

        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        changes.apply(course);
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.courses.len();
        tables.courses.retain(|c| c.id != id);
        Ok(tables.courses.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{test_policy, verify_password};
    use crate::courses::repo_types::USER_ID_MISSING;

    fn store() -> MemoryStore {
        MemoryStore::new(test_policy())
    }

    fn joe(password: &str) -> NewUser {
        NewUser {
            first_name: Some("Joe".into()),
            last_name: Some("Smith".into()),
            email_address: Some("joe@smith.com".into()),
            password: Some(password.into()),
        }
    }

    fn course_for(user_id: Option<Uuid>) -> NewCourse {
        NewCourse {
            title: Some("Build a Basic Bookcase".into()),
            description: Some("High-end furniture projects are great to dream about.".into()),
            estimated_time: Some("12 hours".into()),
            materials_needed: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn stored_password_is_hashed_inside_the_window() {
        let store = store();
        let user = store.create_user(joe("joepassword")).await.unwrap();
        assert_ne!(user.password, "joepassword");
        assert!(verify_password("joepassword".into(), user.password.clone())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn stored_password_is_raw_outside_the_window() {
        let store = store();
        let short = store.create_user(joe("short")).await.unwrap();
        assert_eq!(short.password, "short");

        let mut long = joe(&"x".repeat(21));
        long.email_address = Some("long@smith.com".into());
        let long = store.create_user(long).await.unwrap();
        assert_eq!(long.password, "x".repeat(21));

        let found = store.find_by_email("joe@smith.com").await.unwrap().unwrap();
        assert_eq!(found.password, "short");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = store();
        let original = store.create_user(joe("joepassword")).await.unwrap();

        let mut dupe = joe("otherpassword");
        dupe.first_name = Some("Impostor".into());
        match store.create_user(dupe).await.unwrap_err() {
            StoreError::UniqueConstraint(v) => assert_eq!(v[0].message, EMAIL_TAKEN),
            other => panic!("unexpected {other:?}"),
        }

        let still = store.find_user(original.id).await.unwrap().unwrap();
        assert_eq!(still.first_name, "Joe");
        assert_eq!(still.password, original.password);
    }

    #[tokio::test]
    async fn email_lookup_is_exact() {
        let store = store();
        store.create_user(joe("joepassword")).await.unwrap();
        assert!(store.find_by_email("JOE@smith.com").await.unwrap().is_none());
        assert!(store.find_by_email("joe@smith.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_user_rehashes_and_checks_uniqueness() {
        let store = store();
        let joe_user = store.create_user(joe("joepassword")).await.unwrap();
        let mut sally = joe("sallypassword");
        sally.email_address = Some("sally@jones.com".into());
        store.create_user(sally).await.unwrap();

        let patch = UserPatch {
            email_address: Some(Some("sally@jones.com".into())),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(joe_user.id, patch).await,
            Err(StoreError::UniqueConstraint(_))
        ));

        let patch = UserPatch {
            password: Some(Some("newpassword".into())),
            ..Default::default()
        };
        let updated = store.update_user(joe_user.id, patch).await.unwrap().unwrap();
        assert!(verify_password("newpassword".into(), updated.password.clone())
            .await
            .unwrap());
        assert_eq!(updated.email_address, "joe@smith.com");

        assert!(store
            .update_user(Uuid::new_v4(), UserPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn course_without_owner_is_not_created() {
        let store = store();
        match store.create_course(course_for(None)).await.unwrap_err() {
            StoreError::Validation(v) => assert_eq!(v[0].message, USER_ID_MISSING),
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn course_with_unknown_owner_is_rejected() {
        let store = store();
        match store.create_course(course_for(Some(Uuid::new_v4()))).await.unwrap_err() {
            StoreError::Validation(v) => assert_eq!(v[0].message, USER_ID_UNKNOWN),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn course_lifecycle() {
        let store = store();
        let owner = store.create_user(joe("joepassword")).await.unwrap();
        let course = store.create_course(course_for(Some(owner.id))).await.unwrap();

        let joined = store.find_course_with_owner(course.id).await.unwrap().unwrap();
        assert_eq!(joined.owner.id, owner.id);

        let patch = CoursePatch {
            title: Some(Some("Build a Better Bookcase".into())),
            ..Default::default()
        };
        let updated = store.update_course(course.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "Build a Better Bookcase");
        assert_eq!(updated.description, course.description);

        assert!(store.delete_course(course.id).await.unwrap());
        assert!(!store.delete_course(course.id).await.unwrap());
        assert!(store.find_course(course.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_keeps_creation_order() {
        let store = store();
        let owner = store.create_user(joe("joepassword")).await.unwrap();
        let first = store.create_course(course_for(Some(owner.id))).await.unwrap();
        let mut second = course_for(Some(owner.id));
        second.title = Some("Learn How to Program".into());
        let second = store.create_course(second).await.unwrap();

        let ids: Vec<_> = store
            .list_courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.course.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn list_orders_by_creation_time() {
        let store = store();
        let owner = store.create_user(joe("joepassword")).await.unwrap();
        let recent = store.create_course(course_for(Some(owner.id))).await.unwrap();

        let mut backfilled = recent.clone();
        backfilled.id = Uuid::new_v4();
        backfilled.created_at = recent.created_at - time::Duration::days(1);
        store.tables.write().await.courses.push(backfilled.clone());

        let ids: Vec<_> = store
            .list_courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.course.id)
            .collect();
        assert_eq!(ids, vec![backfilled.id, recent.id]);
    }
}

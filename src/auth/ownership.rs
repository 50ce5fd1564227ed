use tracing::warn;

use super::authenticator::Identity;
use crate::courses::repo_types::Course;
use crate::errors::ApiError;

/// The one authorization rule: only a course's owner may change it.
pub fn authorize(identity: &Identity, course: &Course) -> bool {
    course.user_id == identity.id
}

pub fn ensure_owner(identity: &Identity, course: &Course) -> Result<(), ApiError> {
    if authorize(identity, course) {
        Ok(())
    } else {
        warn!(user_id = %identity.id, course_id = %course.id, "ownership check failed");
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn identity(id: Uuid) -> Identity {
        Identity {
            id,
            first_name: "Joe".into(),
            last_name: "Smith".into(),
            email_address: "joe@smith.com".into(),
        }
    }

    fn course_owned_by(user_id: Uuid) -> Course {
        let now = OffsetDateTime::now_utc();
        Course {
            id: Uuid::new_v4(),
            title: "Title".into(),
            description: "Description".into(),
            estimated_time: None,
            materials_needed: None,
            user_id,
            created_at: now,
        }
    }

    #[test]
    fn owner_is_authorized() {
        let owner = Uuid::new_v4();
        assert!(authorize(&identity(owner), &course_owned_by(owner)));
        assert!(ensure_owner(&identity(owner), &course_owned_by(owner)).is_ok());
    }

    #[test]
    fn anyone_else_is_not() {
        let course = course_owned_by(Uuid::new_v4());
        for _ in 0..5 {
            assert!(!authorize(&identity(Uuid::new_v4()), &course));
        }
        assert!(matches!(
            ensure_owner(&identity(Uuid::new_v4()), &course),
            Err(ApiError::Forbidden)
        ));
    }
}

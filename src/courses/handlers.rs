use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CourseListResponse, CourseResponse};
use super::repo_types::{Course, CoursePatch, NewCourse};
use crate::{
    auth::{ownership::ensure_owner, AuthUser},
    errors::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<CourseListResponse>> {
    let courses = state.courses.list_courses().await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<CourseResponse>> {
    let course = state
        .courses
        .find_course_with_owner(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(CourseResponse {
        course: course.into(),
    }))
}

/// POST /courses: 201 with a Location header for the new course. The caller
/// becomes the owner; a `userId` naming anyone else is refused.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn create_course(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(payload): ApiJson<NewCourse>,
) -> ApiResult<(StatusCode, [(axum::http::HeaderName, String); 1])> {
    if let Some(owner) = payload.user_id {
        if owner != identity.id {
            warn!(requested_owner = %owner, "course owner is not the caller");
            return Err(ApiError::Forbidden);
        }
    }
    let course = state.courses.create_course(payload).await?;
    info!(course_id = %course.id, owner_id = %course.user_id, "course created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/courses/{}", course.id))],
    ))
}

/// Looks the course up before any ownership decision, so a missing id is
/// never mistaken for someone else's course.
async fn load_course(state: &AppState, id: Uuid) -> ApiResult<Course> {
    state.courses.find_course(id).await?.ok_or(ApiError::NotFound)
}

#[instrument(skip_all, fields(user_id = %identity.id, course_id = %id))]
pub async fn update_course(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CoursePatch>,
) -> ApiResult<StatusCode> {
    let course = load_course(&state, id).await?;
    ensure_owner(&identity, &course)?;
    state
        .courses
        .update_course(course.id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!("course updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %identity.id, course_id = %id))]
pub async fn delete_course(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let course = load_course(&state, id).await?;
    ensure_owner(&identity, &course)?;
    if !state.courses.delete_course(course.id).await? {
        return Err(ApiError::NotFound);
    }
    info!("course deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Enrollment lifecycle API handlers.
//!
//! ```text
//! POST /api/v1/enrollments {"userId":"...","courseId":"..."}
//! PUT /api/v1/enrollments/{id}/progress {"progress":60}
//! POST /api/v1/enrollments/{id}/lessons/{lessonId}/complete
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{EnrollmentFilter, UpdateEnrollmentRequest};
use crate::domain::{
    Enrollment, EnrollmentStats, EnrollmentStatus, LessonCompletion, PageRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    EnrollmentSchema, EnrollmentStatsSchema, ErrorSchema, LessonCompletionSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_enum, parse_optional_number, parse_optional_uuid, parse_uuid,
};

const ENROLLMENT_STATUSES: &str = "PENDING, ACTIVE, COMPLETED, CANCELLED";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    /// Whole percentage in `0..=100`; 100 completes the enrollment.
    #[schema(example = 60)]
    pub progress: i64,
}

/// Body for `PUT /api/v1/enrollments/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEnrollmentBody {
    #[schema(example = "CANCELLED")]
    pub status: Option<String>,
    pub progress: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EnrollmentListQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    /// `PENDING`, `ACTIVE`, `COMPLETED` or `CANCELLED`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EnrollmentStatsQuery {
    pub course_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: Option<String>,
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<EnrollmentStatus>> {
    parse_optional_enum(raw, FieldName::new("status"), ENROLLMENT_STATUSES)
}

/// Enroll a user; the enrollment starts ACTIVE with progress 0.
#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "User or course not found", body = ErrorSchema),
        (status = 409, description = "Already enrolled", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "enroll"
)]
#[post("/enrollments")]
pub async fn enroll(
    state: web::Data<HttpState>,
    payload: web::Json<EnrollRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_uuid(&payload.user_id, FieldName::new("userId"))?;
    let course_id = parse_uuid(&payload.course_id, FieldName::new("courseId"))?;
    let enrollment = state.enrollments_command.enroll(user_id, course_id).await?;
    Ok(HttpResponse::Created().json(enrollment))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    params(EnrollmentListQuery),
    responses(
        (status = 200, description = "Enrollments, newest first", body = [EnrollmentSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "listEnrollments"
)]
#[get("/enrollments")]
pub async fn list_enrollments(
    state: web::Data<HttpState>,
    query: web::Query<EnrollmentListQuery>,
) -> ApiResult<web::Json<Vec<Enrollment>>> {
    let query = query.into_inner();
    let page = PageRequest::new(
        parse_optional_number(query.skip.as_deref(), FieldName::new("skip"))?,
        parse_optional_number(query.take.as_deref(), FieldName::new("take"))?,
    );
    let filter = EnrollmentFilter {
        user_id: parse_optional_uuid(query.user_id.as_deref(), FieldName::new("userId"))?,
        course_id: parse_optional_uuid(query.course_id.as_deref(), FieldName::new("courseId"))?,
        status: parse_status(query.status.as_deref())?,
    };
    Ok(web::Json(state.enrollments.list(filter, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/stats",
    params(EnrollmentStatsQuery),
    responses(
        (status = 200, description = "Status counters and rates", body = EnrollmentStatsSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "enrollmentStats"
)]
#[get("/enrollments/stats")]
pub async fn enrollment_stats(
    state: web::Data<HttpState>,
    query: web::Query<EnrollmentStatsQuery>,
) -> ApiResult<web::Json<EnrollmentStats>> {
    let course_id = parse_optional_uuid(query.course_id.as_deref(), FieldName::new("courseId"))?;
    let user_id = parse_optional_uuid(query.user_id.as_deref(), FieldName::new("userId"))?;
    Ok(web::Json(state.enrollments.stats(course_id, user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/user/{userId}",
    params(("userId" = String, Path, description = "User id"), StatusQuery),
    responses(
        (status = 200, description = "The user's enrollments", body = [EnrollmentSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "enrollmentsForUser"
)]
#[get("/enrollments/user/{user_id}")]
pub async fn enrollments_for_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<StatusQuery>,
) -> ApiResult<web::Json<Vec<Enrollment>>> {
    let user_id = parse_uuid(&path, FieldName::new("userId"))?;
    let status = parse_status(query.status.as_deref())?;
    Ok(web::Json(state.enrollments.for_user(user_id, status).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/course/{courseId}",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course's enrollments", body = [EnrollmentSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "enrollmentsForCourse"
)]
#[get("/enrollments/course/{course_id}")]
pub async fn enrollments_for_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Enrollment>>> {
    let course_id = parse_uuid(&path, FieldName::new("courseId"))?;
    Ok(web::Json(state.enrollments.for_course(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment", body = EnrollmentSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "getEnrollment"
)]
#[get("/enrollments/{id}")]
pub async fn get_enrollment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Enrollment>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.enrollments.get(id).await?))
}

/// Change status and/or progress; transitions out of terminal states fail.
#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment id")),
    request_body = UpdateEnrollmentBody,
    responses(
        (status = 200, description = "Updated enrollment", body = EnrollmentSchema),
        (status = 400, description = "Invalid transition or progress", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "updateEnrollment"
)]
#[put("/enrollments/{id}")]
pub async fn update_enrollment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateEnrollmentBody>,
) -> ApiResult<web::Json<Enrollment>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let body = payload.into_inner();
    let request = UpdateEnrollmentRequest {
        status: parse_status(body.status.as_deref())?,
        progress: body.progress,
    };
    Ok(web::Json(state.enrollments_command.update(id, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}/progress",
    params(("id" = String, Path, description = "Enrollment id")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Updated enrollment", body = EnrollmentSchema),
        (status = 400, description = "Progress out of range or enrollment not active", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "updateEnrollmentProgress"
)]
#[put("/enrollments/{id}/progress")]
pub async fn update_progress(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ProgressRequest>,
) -> ApiResult<web::Json<Enrollment>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let enrollment = state
        .enrollments_command
        .update_progress(id, payload.progress)
        .await?;
    Ok(web::Json(enrollment))
}

/// Mark a lesson complete and recompute progress from the lesson tally.
#[utoipa::path(
    post,
    path = "/api/v1/enrollments/{id}/lessons/{lessonId}/complete",
    params(
        ("id" = String, Path, description = "Enrollment id"),
        ("lessonId" = String, Path, description = "Lesson id")
    ),
    responses(
        (status = 200, description = "Lesson progress and enrollment", body = LessonCompletionSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Enrollment not found", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "completeLesson"
)]
#[post("/enrollments/{id}/lessons/{lesson_id}/complete")]
pub async fn complete_lesson(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<LessonCompletion>> {
    let (raw_id, raw_lesson) = path.into_inner();
    let id = parse_uuid(&raw_id, FieldName::new("id"))?;
    let lesson_id = parse_uuid(&raw_lesson, FieldName::new("lessonId"))?;
    let completion = state
        .enrollments_command
        .complete_lesson(id, lesson_id)
        .await?;
    Ok(web::Json(completion))
}

#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment id")),
    responses(
        (status = 204, description = "Enrollment and its lesson progress deleted"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["enrollments"],
    operation_id = "deleteEnrollment"
)]
#[delete("/enrollments/{id}")]
pub async fn delete_enrollment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    state.enrollments_command.remove(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register enrollment routes; literal segments come before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(enroll)
        .service(list_enrollments)
        .service(enrollment_stats)
        .service(enrollments_for_user)
        .service(enrollments_for_course)
        .service(get_enrollment)
        .service(update_enrollment)
        .service(update_progress)
        .service(complete_lesson)
        .service(delete_enrollment);
}

#[cfg(test)]
#[path = "enrollments_tests.rs"]
mod tests;

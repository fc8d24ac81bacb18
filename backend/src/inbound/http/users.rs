//! User directory API handlers.
//!
//! ```text
//! GET /api/v1/users?skip=0&take=10
//! GET /api/v1/users/email/ada@example.com
//! GET /api/v1/users/{id}/progress?courseId=...
//! PUT /api/v1/users/{id} {"role":"INSTRUCTOR"}
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Course, CourseProgressSummary, Enrollment, PageRequest, User, UserRole, UserUpdate,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::courses::SearchQuery;
use crate::inbound::http::schemas::{
    CourseProgressSummarySchema, CourseSchema, EnrollmentSchema, ErrorSchema, UserSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_optional_enum, parse_optional_number, parse_optional_uuid, parse_uuid,
    require_text,
};

const USER_ROLES: &str = "STUDENT, INSTRUCTOR, ADMIN";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProgressQuery {
    /// Restrict the report to one course.
    pub course_id: Option<String>,
}

/// Body for `PUT /api/v1/users/{id}`; omitted fields are kept.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[schema(example = "INSTRUCTOR")]
    pub role: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = crate::domain::Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parse_optional_enum::<UserRole>(
                value.role.as_deref(),
                FieldName::new("role"),
                USER_ROLES,
            )?,
            first_name: value.first_name,
            last_name: value.last_name,
            image_url: value.image_url,
        })
    }
}

/// List users, newest first.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use academy_backend::inbound::http::users::list_users;
///
/// let app = App::new().service(list_users);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = [UserSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Vec<User>>> {
    let page = PageRequest::new(
        parse_optional_number(query.skip.as_deref(), FieldName::new("skip"))?,
        parse_optional_number(query.take.as_deref(), FieldName::new("take"))?,
    );
    Ok(web::Json(state.users.list(page).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Users matching name or email", body = [UserSchema]),
        (status = 400, description = "Blank query", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "searchUsers"
)]
#[get("/users/search")]
pub async fn search_users(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<User>>> {
    let q = require_text(query.into_inner().q, FieldName::new("q"))?;
    Ok(web::Json(state.users.search(q).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/email/{email}",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "User", body = UserSchema),
        (status = 400, description = "Invalid email", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUserByEmail"
)]
#[get("/users/email/{email}")]
pub async fn get_user_by_email(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    Ok(web::Json(state.users.by_email(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.users.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/enrollments",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's enrollments", body = [EnrollmentSchema]),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "userEnrollments"
)]
#[get("/users/{id}/enrollments")]
pub async fn user_enrollments(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Enrollment>>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.users.enrollments(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/courses",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Courses the user teaches", body = [CourseSchema]),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "userCourses"
)]
#[get("/users/{id}/courses")]
pub async fn user_courses(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Course>>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.users.courses_created(id).await?))
}

/// Per-course progress with completed and total lesson counts.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/progress",
    params(("id" = String, Path, description = "User id"), ProgressQuery),
    responses(
        (status = 200, description = "Progress summaries", body = [CourseProgressSummarySchema]),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "userProgress"
)]
#[get("/users/{id}/progress")]
pub async fn user_progress(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ProgressQuery>,
) -> ApiResult<web::Json<Vec<CourseProgressSummary>>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let course_id = parse_optional_uuid(query.course_id.as_deref(), FieldName::new("courseId"))?;
    Ok(web::Json(state.users.progress(id, course_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let update = UserUpdate::try_from(payload.into_inner())?;
    Ok(web::Json(state.users_command.update(id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "User has active enrollments or courses", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    state.users_command.remove(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register user routes; literal segments come before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(search_users)
        .service(get_user_by_email)
        .service(get_user)
        .service(user_enrollments)
        .service(user_courses)
        .service(user_progress)
        .service(update_user)
        .service(delete_user);
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;

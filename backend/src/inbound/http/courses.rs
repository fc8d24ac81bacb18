//! Course catalogue API handlers.
//!
//! ```text
//! POST /api/v1/courses {"title":"Compilers","slug":"compilers",...}
//! GET /api/v1/courses?status=PUBLISHED&take=20
//! GET /api/v1/courses/{id}
//! POST /api/v1/courses/{id}/lessons
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CourseFilter, CourseStats, CourseWithEnrollments};
use crate::domain::{
    Course, CourseDetail, CourseStatus, CourseUpdate, Error, Lesson, LessonUpdate, NewCourse,
    NewLesson, PageRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CourseDetailSchema, CourseSchema, CourseStatsSchema, CourseWithEnrollmentsSchema, ErrorSchema,
    LessonSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_enum, parse_optional_enum, parse_optional_number, parse_optional_uuid,
    parse_uuid, require_text,
};

const COURSE_STATUSES: &str = "DRAFT, PUBLISHED";

/// Body for `POST /api/v1/courses`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    #[schema(example = "analytical-engines")]
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    /// Minor units; zero makes the course free.
    pub price_cents: i64,
    /// ISO 4217 code, `USD` when omitted.
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub instructor_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Body for `PUT /api/v1/courses/{id}`; omitted fields are kept.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    #[schema(example = "PUBLISHED")]
    pub status: Option<String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub position: i32,
    #[serde(default)]
    pub is_preview: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub position: Option<i32>,
    pub is_preview: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    /// Rows to skip.
    pub skip: Option<String>,
    /// Page size, 10 by default and at most 100.
    pub take: Option<String>,
    /// `DRAFT` or `PUBLISHED`.
    pub status: Option<String>,
    pub instructor_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive text matched against titles, descriptions and keywords.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Number of results, clamped to `1..=100`.
    pub limit: Option<String>,
}

impl TryFrom<CreateCourseRequest> for NewCourse {
    type Error = Error;

    fn try_from(value: CreateCourseRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            instructor_id: parse_uuid(&value.instructor_id, FieldName::new("instructorId"))?,
            title: value.title,
            slug: value.slug,
            description: value.description,
            short_description: value.short_description,
            price_cents: value.price_cents,
            currency: value.currency,
            image_url: value.image_url,
            keywords: value.keywords,
        })
    }
}

impl TryFrom<UpdateCourseRequest> for CourseUpdate {
    type Error = Error;

    fn try_from(value: UpdateCourseRequest) -> Result<Self, Self::Error> {
        let status = value
            .status
            .as_deref()
            .map(|raw| parse_enum::<CourseStatus>(raw, FieldName::new("status"), COURSE_STATUSES))
            .transpose()?;
        Ok(Self {
            title: value.title,
            slug: value.slug,
            description: value.description,
            short_description: value.short_description,
            price_cents: value.price_cents,
            currency: value.currency,
            image_url: value.image_url,
            status,
            keywords: value.keywords,
        })
    }
}

impl From<CreateLessonRequest> for NewLesson {
    fn from(value: CreateLessonRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            video_url: value.video_url,
            duration_minutes: value.duration_minutes,
            position: value.position,
            is_preview: value.is_preview,
        }
    }
}

impl From<UpdateLessonRequest> for LessonUpdate {
    fn from(value: UpdateLessonRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            video_url: value.video_url,
            duration_minutes: value.duration_minutes,
            position: value.position,
            is_preview: value.is_preview,
        }
    }
}

pub(crate) fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, Error> {
    parse_optional_number(raw, FieldName::new("limit"))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created as DRAFT", body = CourseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Instructor not found", body = ErrorSchema),
        (status = 409, description = "Slug already taken", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "createCourse"
)]
#[post("/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    payload: web::Json<CreateCourseRequest>,
) -> ApiResult<HttpResponse> {
    let input = NewCourse::try_from(payload.into_inner())?;
    let course = state.courses_command.create(input).await?;
    Ok(HttpResponse::Created().json(course))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Courses, newest first", body = [CourseSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "listCourses"
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    query: web::Query<CourseListQuery>,
) -> ApiResult<web::Json<Vec<Course>>> {
    let query = query.into_inner();
    let page = PageRequest::new(
        parse_optional_number(query.skip.as_deref(), FieldName::new("skip"))?,
        parse_optional_number(query.take.as_deref(), FieldName::new("take"))?,
    );
    let filter = CourseFilter {
        status: parse_optional_enum(
            query.status.as_deref(),
            FieldName::new("status"),
            COURSE_STATUSES,
        )?,
        instructor_id: parse_optional_uuid(
            query.instructor_id.as_deref(),
            FieldName::new("instructorId"),
        )?,
    };
    Ok(web::Json(state.courses.list(filter, page).await?))
}

/// Search published courses.
#[utoipa::path(
    get,
    path = "/api/v1/courses/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching published courses", body = [CourseSchema]),
        (status = 400, description = "Blank query", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "searchCourses"
)]
#[get("/courses/search")]
pub async fn search_courses(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<Course>>> {
    let q = require_text(query.into_inner().q, FieldName::new("q"))?;
    Ok(web::Json(state.courses.search(q).await?))
}

/// Published courses ranked by enrollment count.
#[utoipa::path(
    get,
    path = "/api/v1/courses/popular",
    params(LimitQuery),
    responses(
        (status = 200, description = "Popular courses", body = [CourseWithEnrollmentsSchema]),
        (status = 400, description = "Invalid limit", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "popularCourses"
)]
#[get("/courses/popular")]
pub async fn popular_courses(
    state: web::Data<HttpState>,
    query: web::Query<LimitQuery>,
) -> ApiResult<web::Json<Vec<CourseWithEnrollments>>> {
    let limit = parse_limit(query.limit.as_deref())?;
    Ok(web::Json(state.courses.popular(limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/slug/{slug}",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course with lessons", body = CourseDetailSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "getCourseBySlug"
)]
#[get("/courses/slug/{slug}")]
pub async fn get_course_by_slug(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseDetail>> {
    Ok(web::Json(state.courses.by_slug(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/instructor/{instructorId}",
    params(("instructorId" = String, Path, description = "Instructor user id")),
    responses(
        (status = 200, description = "Courses taught by the instructor", body = [CourseSchema]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "coursesByInstructor"
)]
#[get("/courses/instructor/{instructor_id}")]
pub async fn courses_by_instructor(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Course>>> {
    let instructor_id = parse_uuid(&path, FieldName::new("instructorId"))?;
    Ok(web::Json(state.courses.by_instructor(instructor_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with lessons", body = CourseDetailSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "getCourse"
)]
#[get("/courses/{id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseDetail>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.courses.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/stats",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollment and lesson counters", body = CourseStatsSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "courseStats"
)]
#[get("/courses/{id}/stats")]
pub async fn course_stats(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseStats>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    Ok(web::Json(state.courses.stats(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated course", body = CourseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Slug already taken", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "updateCourse"
)]
#[put("/courses/{id}")]
pub async fn update_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateCourseRequest>,
) -> ApiResult<web::Json<Course>> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    let update = CourseUpdate::try_from(payload.into_inner())?;
    Ok(web::Json(state.courses_command.update(id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Course has enrollments", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "deleteCourse"
)]
#[delete("/courses/{id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, FieldName::new("id"))?;
    state.courses_command.remove(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/lessons",
    params(("id" = String, Path, description = "Course id")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Course not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "createLesson"
)]
#[post("/courses/{id}/lessons")]
pub async fn create_lesson(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CreateLessonRequest>,
) -> ApiResult<HttpResponse> {
    let course_id = parse_uuid(&path, FieldName::new("id"))?;
    let lesson = state
        .courses_command
        .create_lesson(course_id, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(lesson))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/lessons/{lessonId}",
    params(("lessonId" = String, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Updated lesson", body = LessonSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "updateLesson"
)]
#[put("/courses/lessons/{lesson_id}")]
pub async fn update_lesson(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateLessonRequest>,
) -> ApiResult<web::Json<Lesson>> {
    let id = parse_uuid(&path, FieldName::new("lessonId"))?;
    let lesson = state
        .courses_command
        .update_lesson(id, payload.into_inner().into())
        .await?;
    Ok(web::Json(lesson))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/lessons/{lessonId}",
    params(("lessonId" = String, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "deleteLesson"
)]
#[delete("/courses/lessons/{lesson_id}")]
pub async fn delete_lesson(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path, FieldName::new("lessonId"))?;
    state.courses_command.delete_lesson(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register course routes; literal segments come before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_course)
        .service(list_courses)
        .service(search_courses)
        .service(popular_courses)
        .service(get_course_by_slug)
        .service(courses_by_instructor)
        .service(update_lesson)
        .service(delete_lesson)
        .service(get_course)
        .service(course_stats)
        .service(update_course)
        .service(delete_course)
        .service(create_lesson);
}

#[cfg(test)]
#[path = "courses_tests.rs"]
mod tests;

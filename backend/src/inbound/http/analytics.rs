//! Read-only analytics report handlers.

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::RevenuePeriod;
use crate::domain::analytics::{
    CourseAnalytics, Dashboard, PopularCourse, RevenueReport, UserAnalytics,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::courses::{LimitQuery, parse_limit};
use crate::inbound::http::schemas::{
    CourseAnalyticsSchema, DashboardSchema, ErrorSchema, PopularCourseSchema,
    RevenueReportSchema, UserAnalyticsSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_enum, parse_uuid};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    /// One of `7d`, `30d`, `90d`, `1y`; defaults to `30d`.
    pub period: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/dashboard",
    responses((status = 200, description = "Platform overview", body = DashboardSchema)),
    tags = ["analytics"],
    operation_id = "analyticsDashboard"
)]
#[get("/analytics/dashboard")]
pub async fn dashboard(state: web::Data<HttpState>) -> ApiResult<web::Json<Dashboard>> {
    Ok(web::Json(state.analytics.dashboard().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/courses/popular",
    params(LimitQuery),
    responses(
        (status = 200, description = "Courses by enrollment count", body = [PopularCourseSchema]),
        (status = 400, description = "Invalid limit", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "analyticsPopularCourses"
)]
#[get("/analytics/courses/popular")]
pub async fn popular_courses(
    state: web::Data<HttpState>,
    query: web::Query<LimitQuery>,
) -> ApiResult<web::Json<Vec<PopularCourse>>> {
    let limit = parse_limit(query.limit.as_deref())?;
    Ok(web::Json(state.analytics.popular_courses(limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/courses/{courseId}",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course report", body = CourseAnalyticsSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "analyticsCourse"
)]
#[get("/analytics/courses/{course_id}")]
pub async fn course_analytics(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseAnalytics>> {
    let course_id = parse_uuid(&path, FieldName::new("courseId"))?;
    Ok(web::Json(state.analytics.course(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/users/{userId}",
    params(("userId" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User report", body = UserAnalyticsSchema),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "analyticsUser"
)]
#[get("/analytics/users/{user_id}")]
pub async fn user_analytics(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserAnalytics>> {
    let user_id = parse_uuid(&path, FieldName::new("userId"))?;
    Ok(web::Json(state.analytics.user(user_id).await?))
}

/// Revenue from successful payments inside the requested window.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/revenue",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue report", body = RevenueReportSchema),
        (status = 400, description = "Unknown period", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "analyticsRevenue"
)]
#[get("/analytics/revenue")]
pub async fn revenue(
    state: web::Data<HttpState>,
    query: web::Query<RevenueQuery>,
) -> ApiResult<web::Json<RevenueReport>> {
    let period = parse_optional_enum::<RevenuePeriod>(
        query.period.as_deref(),
        FieldName::new("period"),
        "7d, 30d, 90d, 1y",
    )?
    .unwrap_or_default();
    Ok(web::Json(state.analytics.revenue(period).await?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard)
        .service(popular_courses)
        .service(course_analytics)
        .service(user_analytics)
        .service(revenue);
}

#[cfg(test)]
mod tests {
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::Value;
    use uuid::Uuid;

    use super::*;
    use crate::domain::Enrollment;
    use crate::domain::ports::EnrollmentRepository;
    use crate::inbound::http::test_utils::{TestBackend, fixed_now, test_app};

    async fn get<S>(app: &S, uri: &str) -> ServiceResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await
    }

    async fn seeded() -> (TestBackend, Uuid, Uuid) {
        let backend = TestBackend::new();
        let instructor = backend.instructor("grace@example.com").await;
        let student = backend.user("ada@example.com").await;
        let course = backend.course(instructor.id, "compilers", 4900).await;
        let enrollment = Enrollment::new_active(student.id, course.id, fixed_now());
        EnrollmentRepository::insert(&backend.store, &enrollment)
            .await
            .expect("enrollment stored");
        (backend, student.id, course.id)
    }

    #[rstest]
    #[actix_web::test]
    async fn dashboard_counts_platform_totals() {
        let (backend, _, _) = seeded().await;
        let app = test::init_service(test_app(backend.state.clone(), configure)).await;

        let body: Value = test::read_body_json(get(&app, "/api/v1/analytics/dashboard").await).await;

        assert_eq!(body.pointer("/overview/totalUsers").and_then(Value::as_u64), Some(2));
        assert_eq!(
            body.pointer("/overview/activeEnrollments").and_then(Value::as_u64),
            Some(1)
        );
        assert_eq!(
            body.get("monthlyStats")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(12)
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn popular_is_not_shadowed_by_course_ids() {
        let (backend, _, course_id) = seeded().await;
        let app = test::init_service(test_app(backend.state.clone(), configure)).await;

        let res = get(&app, "/api/v1/analytics/courses/popular?limit=5").await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/0/id").and_then(Value::as_str),
            Some(course_id.to_string().as_str())
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn course_and_user_reports_resolve_known_ids() {
        let (backend, student_id, course_id) = seeded().await;
        let app = test::init_service(test_app(backend.state.clone(), configure)).await;

        let course = get(&app, &format!("/api/v1/analytics/courses/{course_id}")).await;
        let user = get(&app, &format!("/api/v1/analytics/users/{student_id}")).await;
        let missing = get(&app, &format!("/api/v1/analytics/users/{}", Uuid::new_v4())).await;

        assert_eq!(course.status(), StatusCode::OK);
        assert_eq!(user.status(), StatusCode::OK);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case("", Some("30d"))]
    #[case("?period=7d", Some("7d"))]
    #[case("?period=1y", Some("1y"))]
    #[actix_web::test]
    async fn revenue_reports_the_requested_period(
        #[case] query: &str,
        #[case] expected: Option<&str>,
    ) {
        let backend = TestBackend::new();
        let app = test::init_service(test_app(backend.state.clone(), configure)).await;

        let body: Value =
            test::read_body_json(get(&app, &format!("/api/v1/analytics/revenue{query}")).await)
                .await;

        assert_eq!(body.pointer("/summary/period").and_then(Value::as_str), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_periods_are_rejected() {
        let backend = TestBackend::new();
        let app = test::init_service(test_app(backend.state.clone(), configure)).await;

        let res = get(&app, "/api/v1/analytics/revenue?period=2w").await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some("invalid_enum")
        );
    }
}

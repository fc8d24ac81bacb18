//! Handler tests for the enrollment endpoints.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;
use crate::inbound::http::test_utils::{TestBackend, test_app};

async fn enroll_via_api<S>(app: &S, user_id: Uuid, course_id: Uuid) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .set_json(json!({"userId": user_id, "courseId": course_id}))
            .to_request(),
    )
    .await
}

fn text<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer).and_then(Value::as_str)
}

#[rstest]
#[actix_web::test]
async fn second_enrollment_for_the_same_pair_conflicts() {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;

    let first = enroll_via_api(&app, student.id, course.id).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(first).await;
    assert_eq!(text(&body, "/status"), Some("ACTIVE"));
    assert_eq!(body.get("progress").and_then(Value::as_u64), Some(0));

    let second = enroll_via_api(&app, student.id, course.id).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn completing_every_lesson_completes_the_enrollment() {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let first_lesson = backend.lesson(course.id, 1).await;
    let second_lesson = backend.lesson(course.id, 2).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;
    let enrolled: Value = test::read_body_json(enroll_via_api(&app, student.id, course.id).await).await;
    let id = text(&enrolled, "/id").expect("enrollment id").to_owned();

    let complete = |lesson_id: Uuid| {
        test::TestRequest::post()
            .uri(&format!("/api/v1/enrollments/{id}/lessons/{lesson_id}/complete"))
            .to_request()
    };

    let halfway: Value = test::call_and_read_body_json(&app, complete(first_lesson.id)).await;
    assert_eq!(
        halfway.pointer("/enrollment/progress").and_then(Value::as_u64),
        Some(50)
    );
    assert_eq!(text(&halfway, "/enrollment/status"), Some("ACTIVE"));
    assert_eq!(text(&halfway, "/lessonProgress/lessonId"), Some(first_lesson.id.to_string().as_str()));

    let done: Value = test::call_and_read_body_json(&app, complete(second_lesson.id)).await;
    assert_eq!(
        done.pointer("/enrollment/progress").and_then(Value::as_u64),
        Some(100)
    );
    assert_eq!(text(&done, "/enrollment/status"), Some("COMPLETED"));
    assert!(done
        .pointer("/enrollment/completedAt")
        .is_some_and(|value| !value.is_null()));
}

#[rstest]
#[case(101)]
#[case(-1)]
#[actix_web::test]
async fn progress_outside_percentage_range_is_rejected(#[case] progress: i64) {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;
    let enrolled: Value = test::read_body_json(enroll_via_api(&app, student.id, course.id).await).await;
    let id = text(&enrolled, "/id").expect("enrollment id");

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{id}/progress"))
            .set_json(json!({"progress": progress}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn full_progress_completes_and_stats_reflect_it() {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;
    let enrolled: Value = test::read_body_json(enroll_via_api(&app, student.id, course.id).await).await;
    let id = text(&enrolled, "/id").expect("enrollment id");

    let updated: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{id}/progress"))
            .set_json(json!({"progress": 100}))
            .to_request(),
    )
    .await;
    assert_eq!(text(&updated, "/status"), Some("COMPLETED"));

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/enrollments/stats?courseId={}", course.id))
            .to_request(),
    )
    .await;
    assert_eq!(stats.get("total").and_then(Value::as_u64), Some(1));
    assert_eq!(stats.get("completed").and_then(Value::as_u64), Some(1));
    assert_eq!(stats.get("completionRate").and_then(Value::as_u64), Some(100));
}

#[rstest]
#[actix_web::test]
async fn cancelled_enrollments_are_listed_by_status() {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;
    let enrolled: Value = test::read_body_json(enroll_via_api(&app, student.id, course.id).await).await;
    let id = text(&enrolled, "/id").expect("enrollment id");

    let cancelled = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{id}"))
            .set_json(json!({"status": "CANCELLED"}))
            .to_request(),
    )
    .await;
    assert_eq!(cancelled.status(), StatusCode::OK);

    let listed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/enrollments/user/{}?status=CANCELLED", student.id))
            .to_request(),
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let reactivated = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{id}"))
            .set_json(json!({"status": "ACTIVE"}))
            .to_request(),
    )
    .await;
    assert_eq!(reactivated.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn deleted_enrollments_are_gone() {
    let backend = TestBackend::new();
    let instructor = backend.instructor("grace@example.com").await;
    let student = backend.user("ada@example.com").await;
    let course = backend.course(instructor.id, "compilers", 0).await;
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;
    let enrolled: Value = test::read_body_json(enroll_via_api(&app, student.id, course.id).await).await;
    let uri = format!("/api/v1/enrollments/{}", text(&enrolled, "/id").expect("id"));

    let deleted =
        test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let fetched = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn unknown_status_filter_is_rejected() {
    let backend = TestBackend::new();
    let app = test::init_service(test_app(backend.state.clone(), configure)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/enrollments?status=DONE")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(text(&body, "/details/code"), Some("invalid_enum"));
}

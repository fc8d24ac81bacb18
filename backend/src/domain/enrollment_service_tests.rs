//! Tests for the enrollment service.

use std::sync::Arc;

use mockall::predicate::eq;
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    EnrollmentRepositoryError, MockCourseRepository, MockEnrollmentRepository,
    MockUserRepository,
};
use crate::domain::service_test_support::{
    enrollment_with, fixture_clock, fixture_timestamp, sample_course, sample_user,
};

type TestService =
    EnrollmentService<MockEnrollmentRepository, MockCourseRepository, MockUserRepository>;

fn make_service(
    enrollments: MockEnrollmentRepository,
    courses: MockCourseRepository,
    users: MockUserRepository,
) -> TestService {
    EnrollmentService::new(
        Arc::new(enrollments),
        Arc::new(courses),
        Arc::new(users),
        fixture_clock(),
    )
}

fn courses_with_one() -> (MockCourseRepository, Uuid) {
    let course = sample_course(Uuid::new_v4(), 0);
    let course_id = course.id;
    let mut courses = MockCourseRepository::new();
    courses
        .expect_find_by_id()
        .with(eq(course_id))
        .return_once(move |_| Ok(Some(course)));
    (courses, course_id)
}

fn users_with_one() -> (MockUserRepository, Uuid) {
    let user = sample_user("ada@example.com");
    let user_id = user.id;
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .with(eq(user_id))
        .return_once(move |_| Ok(Some(user)));
    (users, user_id)
}

#[tokio::test]
async fn enroll_creates_active_enrollment() {
    let (courses, course_id) = courses_with_one();
    let (users, user_id) = users_with_one();
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_user_and_course()
        .with(eq(user_id), eq(course_id))
        .return_once(|_, _| Ok(None));
    enrollments.expect_insert().times(1).returning(|_| Ok(()));

    let service = make_service(enrollments, courses, users);
    let enrollment = service.enroll(user_id, course_id).await.expect("enrolled");

    assert_eq!(enrollment.status(), EnrollmentStatus::Active);
    assert_eq!(enrollment.progress(), Progress::ZERO);
    assert_eq!(enrollment.enrolled_at(), fixture_timestamp());
}

#[tokio::test]
async fn enroll_twice_is_conflict_before_course_and_user_lookups() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_user_and_course()
        .return_once(|_, _| Ok(Some(enrollment_with(EnrollmentStatus::Active, 0))));
    enrollments.expect_insert().never();
    let mut courses = MockCourseRepository::new();
    courses.expect_find_by_id().never();
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().never();

    let service = make_service(enrollments, courses, users);
    let error = service
        .enroll(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("duplicate enrollment");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn enroll_race_lost_at_constraint_is_conflict() {
    let (courses, course_id) = courses_with_one();
    let (users, user_id) = users_with_one();
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_user_and_course()
        .return_once(|_, _| Ok(None));
    enrollments
        .expect_insert()
        .return_once(|_| Err(EnrollmentRepositoryError::duplicate("user_id, course_id")));

    let service = make_service(enrollments, courses, users);
    let error = service
        .enroll(user_id, course_id)
        .await
        .expect_err("constraint violation");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn enroll_in_unknown_course_is_not_found() {
    let mut courses = MockCourseRepository::new();
    courses.expect_find_by_id().return_once(|_| Ok(None));
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_user_and_course()
        .return_once(|_, _| Ok(None));
    enrollments.expect_insert().never();

    let service = make_service(enrollments, courses, MockUserRepository::new());
    let error = service
        .enroll(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("missing course");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn enroll_unknown_user_is_not_found() {
    let (courses, course_id) = courses_with_one();
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_user_and_course()
        .return_once(|_, _| Ok(None));

    let service = make_service(enrollments, courses, users);
    let error = service
        .enroll(Uuid::new_v4(), course_id)
        .await
        .expect_err("missing user");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(-1)]
#[case(101)]
#[tokio::test]
async fn update_progress_rejects_out_of_range_values(#[case] value: i64) {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments.expect_update_progress().never();

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service
        .update_progress(Uuid::new_v4(), value)
        .await
        .expect_err("out of range");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    let details = error.details().expect("details");
    assert_eq!(details["field"], "progress");
}

#[tokio::test]
async fn update_progress_passes_clock_time_to_repository() {
    let id = Uuid::new_v4();
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_update_progress()
        .withf(move |got, progress, now| {
            *got == id && progress.value() == 100 && *now == fixture_timestamp()
        })
        .return_once(|_, _, _| Ok(enrollment_with(EnrollmentStatus::Completed, 100)));

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let enrollment = service.update_progress(id, 100).await.expect("updated");

    assert_eq!(enrollment.status(), EnrollmentStatus::Completed);
    assert!(enrollment.completed_at().is_some());
}

#[tokio::test]
async fn update_progress_surfaces_rejected_transition() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments.expect_update_progress().return_once(|_, _, _| {
        Err(EnrollmentRepositoryError::rejected(
            "progress can only change on ACTIVE or COMPLETED enrollments, not CANCELLED",
        ))
    });

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service
        .update_progress(Uuid::new_v4(), 40)
        .await
        .expect_err("cancelled enrollment");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn complete_lesson_missing_enrollment_is_not_found() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_complete_lesson()
        .return_once(|id, _, _| {
            Err(EnrollmentRepositoryError::missing(format!(
                "enrollment {id} not found"
            )))
        });

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service
        .complete_lesson(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn update_requires_a_field() {
    let service = make_service(
        MockEnrollmentRepository::new(),
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service
        .update(Uuid::new_v4(), UpdateEnrollmentRequest::default())
        .await
        .expect_err("empty update");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn update_forwards_validated_change() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_change()
        .withf(|_, change, _| {
            change.status == Some(EnrollmentStatus::Cancelled)
                && change.progress.map(Progress::value) == Some(30)
        })
        .return_once(|_, _, _| Ok(enrollment_with(EnrollmentStatus::Cancelled, 30)));

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let enrollment = service
        .update(
            Uuid::new_v4(),
            UpdateEnrollmentRequest {
                status: Some(EnrollmentStatus::Cancelled),
                progress: Some(30),
            },
        )
        .await
        .expect("changed");

    assert_eq!(enrollment.status(), EnrollmentStatus::Cancelled);
}

#[tokio::test]
async fn remove_absent_enrollment_is_not_found() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments.expect_delete().return_once(|_| Ok(false));

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service
        .remove(Uuid::new_v4())
        .await
        .expect_err("absent");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn stats_aggregate_filtered_enrollments() {
    let course_id = Uuid::new_v4();
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_list_all()
        .withf(move |filter| filter.course_id == Some(course_id) && filter.user_id.is_none())
        .return_once(|_| {
            Ok(vec![
                enrollment_with(EnrollmentStatus::Completed, 100),
                enrollment_with(EnrollmentStatus::Active, 50),
                enrollment_with(EnrollmentStatus::Pending, 0),
                enrollment_with(EnrollmentStatus::Cancelled, 0),
            ])
        });

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let stats = service.stats(Some(course_id), None).await.expect("stats");

    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.completion_rate, 25);
}

#[tokio::test]
async fn connection_failure_is_service_unavailable() {
    let mut enrollments = MockEnrollmentRepository::new();
    enrollments
        .expect_find_by_id()
        .return_once(|_| Err(EnrollmentRepositoryError::connection("pool exhausted")));

    let service = make_service(
        enrollments,
        MockCourseRepository::new(),
        MockUserRepository::new(),
    );
    let error = service.get(Uuid::new_v4()).await.expect_err("unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

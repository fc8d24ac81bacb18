//! Behaviour of the in-memory store's multi-step operations.

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::ports::{
    CertificateRepository, CertificateRepositoryError, CourseRepository, EnrollmentRepository,
    EnrollmentRepositoryError, PaymentRepository, PaymentRepositoryError, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    Course, Currency, EmailAddress, Enrollment, EnrollmentStatus, IdentityProfile, Lesson,
    NewCourse, NewLesson, Payment, PaymentEvent, PaymentLookup, PaymentStatus, Progress,
    ReconcileOutcome, RefundReason, RefundReceipt, User,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn user(email: &str) -> User {
    User::register(
        IdentityProfile {
            external_id: format!("idp_{email}"),
            email: EmailAddress::new(email).expect("valid email"),
            first_name: None,
            last_name: None,
            image_url: None,
        },
        at(1, 8),
    )
    .expect("valid user")
}

fn lesson(course_id: Uuid, position: i32) -> Lesson {
    Lesson::create(
        course_id,
        NewLesson {
            title: format!("Lesson {position}"),
            content: String::new(),
            video_url: None,
            duration_minutes: None,
            position,
            is_preview: false,
        },
        at(1, 9),
    )
    .expect("valid lesson")
}

struct Seeded {
    store: MemoryStore,
    student: User,
    course: Course,
}

#[fixture]
async fn seeded() -> Seeded {
    let store = MemoryStore::new();
    let instructor = user("teacher@example.com");
    let student = user("student@example.com");
    let course = Course::create(
        NewCourse {
            title: "Type Theory".to_owned(),
            slug: "type-theory".to_owned(),
            description: String::new(),
            short_description: None,
            price_cents: 4_900,
            currency: None,
            image_url: None,
            instructor_id: instructor.id,
            keywords: Vec::new(),
        },
        at(1, 9),
    )
    .expect("valid course");
    UserRepository::insert(&store, &instructor).await.expect("instructor");
    UserRepository::insert(&store, &student).await.expect("student");
    CourseRepository::insert(&store, &course).await.expect("course");
    Seeded {
        store,
        student,
        course,
    }
}

impl Seeded {
    async fn with_lessons(&self, count: i32) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for position in 1..=count {
            let lesson = lesson(self.course.id, position);
            ids.push(lesson.id);
            self.store.insert_lesson(&lesson).await.expect("lesson");
        }
        ids
    }

    async fn enrolled(&self) -> Enrollment {
        let enrollment = Enrollment::new_active(self.student.id, self.course.id, at(2, 10));
        EnrollmentRepository::insert(&self.store, &enrollment)
            .await
            .expect("enrolled");
        enrollment
    }

    async fn checkout(&self, session: &str) -> Payment {
        let enrollment = Enrollment::new_pending(self.student.id, self.course.id, at(2, 10));
        let payment = Payment::pending_checkout(
            &enrollment,
            self.course.price_cents,
            Currency::default(),
            session,
            at(2, 10),
        );
        self.store
            .create_pending_checkout(&enrollment, &payment)
            .await
            .expect("checkout");
        payment
    }
}

#[rstest]
#[tokio::test]
async fn second_enrollment_for_pair_is_duplicate(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let first = seeded.enrolled().await;
    let again = Enrollment::new_active(first.user_id(), first.course_id(), at(3, 10));

    let error = EnrollmentRepository::insert(&seeded.store, &again)
        .await
        .expect_err("pair taken");

    assert!(matches!(error, EnrollmentRepositoryError::Duplicate { .. }));
}

#[rstest]
#[tokio::test]
async fn completing_every_lesson_completes_once(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let lessons = seeded.with_lessons(2).await;
    let enrollment = seeded.enrolled().await;

    let half = seeded
        .store
        .complete_lesson(enrollment.id(), lessons[1], at(3, 10))
        .await
        .expect("first lesson");
    assert_eq!(half.enrollment.progress().value(), 50);
    assert_eq!(half.enrollment.status(), EnrollmentStatus::Active);

    let done = seeded
        .store
        .complete_lesson(enrollment.id(), lessons[0], at(4, 10))
        .await
        .expect("second lesson");
    assert_eq!(done.enrollment.progress(), Progress::COMPLETE);
    assert_eq!(done.enrollment.status(), EnrollmentStatus::Completed);
    assert_eq!(done.enrollment.completed_at(), Some(at(4, 10)));

    let repeat = seeded
        .store
        .complete_lesson(enrollment.id(), lessons[0], at(5, 10))
        .await
        .expect("repeat");
    assert_eq!(repeat.enrollment.completed_at(), Some(at(4, 10)));
    assert_eq!(repeat.lesson_progress.completed_at, Some(at(4, 10)));
    let tally = seeded
        .store
        .lesson_tally(enrollment.id())
        .await
        .expect("tally");
    assert_eq!((tally.completed, tally.total), (2, 2));
}

#[rstest]
#[tokio::test]
async fn lesson_on_empty_course_leaves_progress_at_zero(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let enrollment = seeded.enrolled().await;

    let completion = seeded
        .store
        .complete_lesson(enrollment.id(), Uuid::new_v4(), at(3, 10))
        .await
        .expect("no failure without lessons");

    assert_eq!(completion.enrollment.progress(), Progress::ZERO);
    assert_eq!(completion.enrollment.status(), EnrollmentStatus::Active);
}

#[rstest]
#[tokio::test]
async fn cancelled_enrollment_records_no_lesson(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let lessons = seeded.with_lessons(1).await;
    let payment = seeded.checkout("cs_cancel").await;
    seeded
        .store
        .reconcile(
            PaymentLookup::CheckoutSession("cs_cancel".to_owned()),
            PaymentEvent::CheckoutSessionCompleted {
                session_id: "cs_cancel".to_owned(),
                payment_intent_id: Some("pi_cancel".to_owned()),
                receipt_url: None,
            },
            at(3, 10),
        )
        .await
        .expect("paid");
    seeded
        .store
        .mark_refunded(
            payment.id,
            RefundReceipt {
                refund_id: "re_1".to_owned(),
                amount_cents: payment.amount_cents,
                reason: RefundReason::RequestedByCustomer,
            },
            at(3, 12),
        )
        .await
        .expect("refunded");

    let error = seeded
        .store
        .complete_lesson(payment.enrollment_id, lessons[0], at(4, 10))
        .await
        .expect_err("cancelled");

    assert!(matches!(error, EnrollmentRepositoryError::Rejected { .. }));
    let tally = seeded
        .store
        .lesson_tally(payment.enrollment_id)
        .await
        .expect("tally");
    assert_eq!(tally.completed, 0);
}

#[rstest]
#[tokio::test]
async fn reconcile_activates_and_tolerates_redelivery(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    seeded.checkout("cs_ok").await;
    let event = PaymentEvent::CheckoutSessionCompleted {
        session_id: "cs_ok".to_owned(),
        payment_intent_id: Some("pi_ok".to_owned()),
        receipt_url: Some("https://receipts.example.test/1".to_owned()),
    };
    let lookup = PaymentLookup::CheckoutSession("cs_ok".to_owned());

    let first = seeded
        .store
        .reconcile(lookup.clone(), event.clone(), at(3, 10))
        .await
        .expect("applied");
    let second = seeded
        .store
        .reconcile(lookup, event, at(3, 11))
        .await
        .expect("redelivered");

    assert_eq!(first.outcome, ReconcileOutcome::Applied);
    assert_eq!(first.payment.status, PaymentStatus::Succeeded);
    assert_eq!(first.enrollment.status(), EnrollmentStatus::Active);
    assert_eq!(second.outcome, ReconcileOutcome::AlreadyApplied);
    assert_eq!(second.payment.paid_at, Some(at(3, 10)));
}

#[rstest]
#[tokio::test]
async fn reconcile_unknown_intent_is_missing(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let error = seeded
        .store
        .reconcile(
            PaymentLookup::PaymentIntent("pi_nowhere".to_owned()),
            PaymentEvent::PaymentIntentSucceeded {
                payment_intent_id: "pi_nowhere".to_owned(),
                receipt_url: None,
            },
            at(3, 10),
        )
        .await
        .expect_err("unknown");

    assert!(matches!(error, PaymentRepositoryError::Missing { .. }));
}

#[rstest]
#[tokio::test]
async fn refunding_pending_payment_is_rejected(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let payment = seeded.checkout("cs_pending").await;

    let error = seeded
        .store
        .mark_refunded(
            payment.id,
            RefundReceipt {
                refund_id: "re_x".to_owned(),
                amount_cents: 1,
                reason: RefundReason::Duplicate,
            },
            at(3, 10),
        )
        .await
        .expect_err("pending");

    assert!(matches!(error, PaymentRepositoryError::Rejected { .. }));
    let stored = seeded
        .store
        .find_by_session("cs_pending")
        .await
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.status, PaymentStatus::Pending);
}

#[rstest]
#[tokio::test]
async fn a_refund_claim_is_held_until_released(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let payment = seeded.checkout("cs_claim").await;
    seeded
        .store
        .reconcile(
            PaymentLookup::CheckoutSession("cs_claim".to_owned()),
            PaymentEvent::CheckoutSessionCompleted {
                session_id: "cs_claim".to_owned(),
                payment_intent_id: Some("pi_claim".to_owned()),
                receipt_url: None,
            },
            at(3, 10),
        )
        .await
        .expect("settled");

    let claim = seeded
        .store
        .claim_refund(payment.id, None, at(3, 11))
        .await
        .expect("claimed");
    let contested = seeded
        .store
        .claim_refund(payment.id, Some(100), at(3, 11))
        .await
        .expect_err("claim held");
    seeded
        .store
        .release_refund_claim(payment.id)
        .await
        .expect("released");
    let retried = seeded.store.claim_refund(payment.id, None, at(3, 11)).await;

    assert_eq!(claim.payment_intent_id, "pi_claim");
    assert_eq!(claim.amount_cents, 4_900);
    assert!(matches!(contested, PaymentRepositoryError::Duplicate { .. }));
    assert!(retried.is_ok());
}

#[rstest]
#[tokio::test]
async fn certificates_are_idempotent_and_sequenced(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let enrollment = seeded.enrolled().await;

    let refused = seeded
        .store
        .issue(enrollment.id(), at(3, 10))
        .await
        .expect_err("still active");
    assert!(matches!(refused, CertificateRepositoryError::Rejected { .. }));

    seeded
        .store
        .update_progress(enrollment.id(), Progress::COMPLETE, at(3, 11))
        .await
        .expect("completed");
    let first = seeded
        .store
        .issue(enrollment.id(), at(3, 12))
        .await
        .expect("issued");
    let again = seeded
        .store
        .issue(enrollment.id(), at(4, 12))
        .await
        .expect("idempotent");

    assert!(first.newly_issued);
    assert!(!again.newly_issued);
    assert_eq!(first.certificate, again.certificate);
    assert_eq!(first.certificate.certificate_number.as_str(), "CERT-202604-0001");

    let other = user("second@example.com");
    UserRepository::insert(&seeded.store, &other).await.expect("user");
    let mut next = Enrollment::new_active(other.id, seeded.course.id, at(3, 13));
    next.apply_progress(Progress::COMPLETE, at(3, 13))
        .expect("complete");
    EnrollmentRepository::insert(&seeded.store, &next)
        .await
        .expect("enrolled");
    let second = seeded
        .store
        .issue(next.id(), at(3, 14))
        .await
        .expect("issued");
    assert_eq!(second.certificate.certificate_number.as_str(), "CERT-202604-0002");
}

#[rstest]
#[tokio::test]
async fn email_collision_is_duplicate(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let mut clash = user("student@example.com");
    clash.external_id = "idp_other".to_owned();

    let error = UserRepository::insert(&seeded.store, &clash)
        .await
        .expect_err("email taken");

    assert!(matches!(error, UserRepositoryError::Duplicate { .. }));
}

#[rstest]
#[tokio::test]
async fn deleting_lesson_drops_its_progress(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let lessons = seeded.with_lessons(2).await;
    let enrollment = seeded.enrolled().await;
    seeded
        .store
        .complete_lesson(enrollment.id(), lessons[0], at(3, 10))
        .await
        .expect("completed");

    assert!(seeded.store.delete_lesson(lessons[0]).await.expect("deleted"));

    let tally = seeded
        .store
        .lesson_tally(enrollment.id())
        .await
        .expect("tally");
    assert_eq!((tally.completed, tally.total), (0, 1));
}

//! Shared harness: every domain service wired over one set of repositories
//! (the in-memory store unless a suite supplies its own) with a fixed clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use academy_backend::domain::ports::{
    AnalyticsRepository, CertificateRepository, CheckoutCommand, CheckoutRequest, CourseCommand,
    CourseRepository, EnrollmentCommand, EnrollmentRepository, GatewaySession, IdentityEvent,
    PaymentGateway, PaymentGatewayError, PaymentRepository, RefundRequest, UserCommand, UserQuery,
    UserRepository,
};
use academy_backend::domain::{
    Course, CourseStatus, CourseUpdate, EmailAddress, Enrollment, IdentityProfile, Lesson,
    NewCourse, NewLesson, RefundReceipt, User, UserRole, UserUpdate,
};
use academy_backend::inbound::http::state::{HttpStatePorts, Repositories};
use academy_backend::outbound::memory::MemoryStore;
use academy_backend::outbound::payments::LocalPaymentGateway;
use academy_backend::outbound::pdf::PdfCertificateRenderer;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 2, 10, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixedClock;

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        fixed_now().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        fixed_now()
    }
}

/// Local processor that answers refunds after a delay and counts them.
pub(crate) struct CountingGateway {
    inner: LocalPaymentGateway,
    refund_delay: Duration,
    refunds: AtomicUsize,
}

impl CountingGateway {
    pub(crate) fn with_refund_delay(refund_delay: Duration) -> Self {
        Self {
            inner: LocalPaymentGateway::new("https://checkout.example.test"),
            refund_delay,
            refunds: AtomicUsize::new(0),
        }
    }

    pub(crate) fn refunds(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for CountingGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<GatewaySession, PaymentGatewayError> {
        self.inner.create_checkout_session(request).await
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundReceipt, PaymentGatewayError> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refund_delay).await;
        self.inner.refund(request).await
    }
}

pub(crate) struct Platform {
    pub(crate) ports: HttpStatePorts,
}

impl Platform {
    pub(crate) fn new() -> Self {
        Self::with_gateway(Arc::new(LocalPaymentGateway::new(
            "https://checkout.example.test",
        )))
    }

    /// Wire the services around a caller-supplied payment processor.
    pub(crate) fn with_gateway<G: PaymentGateway + 'static>(gateway: Arc<G>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::assemble(
            Repositories {
                users: store.clone(),
                courses: store.clone(),
                enrollments: store.clone(),
                payments: store.clone(),
                certificates: store.clone(),
                analytics: store,
            },
            gateway,
        )
    }

    pub(crate) fn assemble<U, C, E, P, R, A, G>(
        repositories: Repositories<U, C, E, P, R, A>,
        gateway: Arc<G>,
    ) -> Self
    where
        U: UserRepository + 'static,
        C: CourseRepository + 'static,
        E: EnrollmentRepository + 'static,
        P: PaymentRepository + 'static,
        R: CertificateRepository + 'static,
        A: AnalyticsRepository + 'static,
        G: PaymentGateway + 'static,
    {
        let ports = HttpStatePorts::from_repositories(
            repositories,
            gateway,
            Arc::new(PdfCertificateRenderer),
            Arc::new(FixedClock),
        );
        Self { ports }
    }

    /// Register a student through the identity webhook path.
    pub(crate) async fn student(&self, email: &str) -> User {
        let profile = IdentityProfile {
            external_id: format!("idp_{email}"),
            email: EmailAddress::new(email).expect("valid email"),
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            image_url: None,
        };
        self.ports
            .users_command
            .sync_identity(IdentityEvent::Upsert {
                event_type: "user.created".to_owned(),
                profile,
            })
            .await
            .expect("identity synced");
        self.ports
            .users
            .by_email(email.to_owned())
            .await
            .expect("user registered")
    }

    pub(crate) async fn instructor(&self, email: &str) -> User {
        let user = self.student(email).await;
        self.ports
            .users_command
            .update(
                user.id,
                UserUpdate {
                    role: Some(UserRole::Instructor),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("role updated")
    }

    /// Create and publish a course.
    pub(crate) async fn published_course(
        &self,
        instructor_id: Uuid,
        slug: &str,
        price_cents: i64,
    ) -> Course {
        let course = self
            .ports
            .courses_command
            .create(NewCourse {
                title: format!("Course {slug}"),
                slug: slug.to_owned(),
                description: "A course".to_owned(),
                short_description: None,
                price_cents,
                currency: None,
                image_url: None,
                instructor_id,
                keywords: Vec::new(),
            })
            .await
            .expect("course created");
        self.ports
            .courses_command
            .update(
                course.id,
                CourseUpdate {
                    status: Some(CourseStatus::Published),
                    ..CourseUpdate::default()
                },
            )
            .await
            .expect("course published")
    }

    pub(crate) async fn lesson(&self, course_id: Uuid, position: i32) -> Lesson {
        self.ports
            .courses_command
            .create_lesson(
                course_id,
                NewLesson {
                    title: format!("Lesson {position}"),
                    content: "Content".to_owned(),
                    video_url: None,
                    duration_minutes: Some(5),
                    position,
                    is_preview: false,
                },
            )
            .await
            .expect("lesson created")
    }

    /// Enroll and drive progress to 100.
    pub(crate) async fn completed_enrollment(&self, user_id: Uuid, course_id: Uuid) -> Enrollment {
        let enrollment = self
            .ports
            .enrollments_command
            .enroll(user_id, course_id)
            .await
            .expect("enrolled");
        self.ports
            .enrollments_command
            .update_progress(enrollment.id(), 100)
            .await
            .expect("completed")
    }

    pub(crate) fn checkout(course_id: Uuid, user_id: Uuid) -> CheckoutCommand {
        CheckoutCommand {
            course_id,
            user_id,
            success_url: "https://academy.example.test/success".to_owned(),
            cancel_url: "https://academy.example.test/cancel".to_owned(),
        }
    }
}

//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{CourseRepository, UserRepository};
use crate::domain::{
    Course, CourseStatus, CourseUpdate, EmailAddress, IdentityProfile, Lesson, NewCourse,
    NewLesson, User, UserRole,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts, Repositories, WebhookVerifiers};
use crate::inbound::http::webhook_signature::{DEFAULT_TOLERANCE_SECS, WebhookVerifier};
use crate::middleware::Trace;
use crate::outbound::memory::MemoryStore;
use crate::outbound::payments::LocalPaymentGateway;
use crate::outbound::pdf::PdfCertificateRenderer;

pub const PAYMENT_SECRET: &str = "whsec_payments";
pub const IDENTITY_SECRET: &str = "whsec_identity";

pub fn fixed_now() -> DateTime<Utc> {
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

/// In-memory backend with handles for seeding data.
pub struct TestBackend {
    pub store: MemoryStore,
    pub state: HttpState,
}

impl TestBackend {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock);
        let ports = HttpStatePorts::from_repositories(
            Repositories {
                users: shared.clone(),
                courses: shared.clone(),
                enrollments: shared.clone(),
                payments: shared.clone(),
                certificates: shared.clone(),
                analytics: shared,
            },
            Arc::new(LocalPaymentGateway::new("https://checkout.example.test")),
            Arc::new(PdfCertificateRenderer),
            clock.clone(),
        );
        let webhooks = WebhookVerifiers {
            payments: WebhookVerifier::new(Some(PAYMENT_SECRET), DEFAULT_TOLERANCE_SECS),
            identity: WebhookVerifier::new(Some(IDENTITY_SECRET), DEFAULT_TOLERANCE_SECS),
        };
        Self {
            store,
            state: HttpState::new(ports, webhooks, clock),
        }
    }

    pub async fn user(&self, email: &str) -> User {
        let user = User::register(
            IdentityProfile {
                external_id: format!("idp_{email}"),
                email: EmailAddress::new(email).expect("valid email"),
                first_name: Some("Ada".to_owned()),
                last_name: Some("Lovelace".to_owned()),
                image_url: None,
            },
            fixed_now(),
        )
        .expect("valid user");
        UserRepository::insert(&self.store, &user)
            .await
            .expect("user stored");
        user
    }

    pub async fn instructor(&self, email: &str) -> User {
        let mut user = self.user(email).await;
        user.role = UserRole::Instructor;
        UserRepository::update(&self.store, &user)
            .await
            .expect("user updated");
        user
    }

    /// Published course owned by `instructor_id`.
    pub async fn course(&self, instructor_id: Uuid, slug: &str, price_cents: i64) -> Course {
        let mut course = Course::create(
            NewCourse {
                title: format!("Course {slug}"),
                slug: slug.to_owned(),
                description: "A course".to_owned(),
                short_description: None,
                price_cents,
                currency: None,
                image_url: None,
                instructor_id,
                keywords: vec!["rust".to_owned()],
            },
            fixed_now(),
        )
        .expect("valid course");
        course
            .apply_update(
                CourseUpdate {
                    status: Some(CourseStatus::Published),
                    ..CourseUpdate::default()
                },
                fixed_now(),
            )
            .expect("publish course");
        CourseRepository::insert(&self.store, &course)
            .await
            .expect("course stored");
        course
    }

    pub async fn lesson(&self, course_id: Uuid, position: i32) -> Lesson {
        let lesson = Lesson::create(
            course_id,
            NewLesson {
                title: format!("Lesson {position}"),
                content: "Content".to_owned(),
                video_url: None,
                duration_minutes: Some(10),
                position,
                is_preview: false,
            },
            fixed_now(),
        )
        .expect("valid lesson");
        self.store
            .insert_lesson(&lesson)
            .await
            .expect("lesson stored");
        lesson
    }
}

/// App with the trace middleware and `configure` mounted under `/api/v1`.
pub fn test_app<F>(
    state: HttpState,
    configure: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    App::new()
        .app_data(web::Data::new(state))
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure))
}

//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AnalyticsQuery, AnalyticsRepository, CertificateCommand, CertificateQuery,
    CertificateRenderer, CertificateRepository, CourseCommand, CourseQuery, CourseRepository,
    EnrollmentCommand, EnrollmentQuery, EnrollmentRepository, PaymentCommand, PaymentGateway,
    PaymentQuery, PaymentRepository, UserCommand, UserQuery, UserRepository,
};
use crate::domain::{
    AnalyticsService, CertificateService, CertificateServiceDeps, CourseService,
    EnrollmentService, PaymentService, PaymentServiceDeps, UserService,
};
use crate::inbound::http::webhook_signature::WebhookVerifier;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserQuery>,
    pub users_command: Arc<dyn UserCommand>,
    pub courses: Arc<dyn CourseQuery>,
    pub courses_command: Arc<dyn CourseCommand>,
    pub enrollments: Arc<dyn EnrollmentQuery>,
    pub enrollments_command: Arc<dyn EnrollmentCommand>,
    pub payments: Arc<dyn PaymentQuery>,
    pub payments_command: Arc<dyn PaymentCommand>,
    pub certificates: Arc<dyn CertificateQuery>,
    pub certificates_command: Arc<dyn CertificateCommand>,
    pub analytics: Arc<dyn AnalyticsQuery>,
}

/// Driven adapters the domain services are built over.
pub struct Repositories<U, C, E, P, R, A> {
    pub users: Arc<U>,
    pub courses: Arc<C>,
    pub enrollments: Arc<E>,
    pub payments: Arc<P>,
    pub certificates: Arc<R>,
    pub analytics: Arc<A>,
}

impl HttpStatePorts {
    /// Build every domain service over the given adapters.
    pub fn from_repositories<U, C, E, P, R, A, G, D>(
        repos: Repositories<U, C, E, P, R, A>,
        gateway: Arc<G>,
        renderer: Arc<D>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        U: UserRepository + 'static,
        C: CourseRepository + 'static,
        E: EnrollmentRepository + 'static,
        P: PaymentRepository + 'static,
        R: CertificateRepository + 'static,
        A: AnalyticsRepository + 'static,
        G: PaymentGateway + 'static,
        D: CertificateRenderer + 'static,
    {
        let Repositories {
            users,
            courses,
            enrollments,
            payments,
            certificates,
            analytics,
        } = repos;

        let user_service = Arc::new(UserService::new(
            users.clone(),
            enrollments.clone(),
            courses.clone(),
            clock.clone(),
        ));
        let course_service = Arc::new(CourseService::new(
            courses.clone(),
            enrollments.clone(),
            users.clone(),
            clock.clone(),
        ));
        let enrollment_service = Arc::new(EnrollmentService::new(
            enrollments.clone(),
            courses.clone(),
            users.clone(),
            clock.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(PaymentServiceDeps {
            payments,
            enrollments,
            courses: courses.clone(),
            users: users.clone(),
            gateway,
            clock: clock.clone(),
        }));
        let certificate_service = Arc::new(CertificateService::new(CertificateServiceDeps {
            certificates,
            courses,
            users,
            renderer,
            clock: clock.clone(),
        }));
        let analytics_service = Arc::new(AnalyticsService::new(analytics, clock));

        Self {
            users: user_service.clone(),
            users_command: user_service,
            courses: course_service.clone(),
            courses_command: course_service,
            enrollments: enrollment_service.clone(),
            enrollments_command: enrollment_service,
            payments: payment_service.clone(),
            payments_command: payment_service,
            certificates: certificate_service.clone(),
            certificates_command: certificate_service,
            analytics: analytics_service,
        }
    }
}

/// Webhook verification settings.
#[derive(Clone, Debug)]
pub struct WebhookVerifiers {
    /// Checks the payment processor's `stripe-signature` header.
    pub payments: WebhookVerifier,
    /// Checks the identity provider's `webhook-signature` header when set.
    pub identity: WebhookVerifier,
}

impl Default for WebhookVerifiers {
    fn default() -> Self {
        Self {
            payments: WebhookVerifier::disabled(),
            identity: WebhookVerifier::disabled(),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserQuery>,
    pub users_command: Arc<dyn UserCommand>,
    pub courses: Arc<dyn CourseQuery>,
    pub courses_command: Arc<dyn CourseCommand>,
    pub enrollments: Arc<dyn EnrollmentQuery>,
    pub enrollments_command: Arc<dyn EnrollmentCommand>,
    pub payments: Arc<dyn PaymentQuery>,
    pub payments_command: Arc<dyn PaymentCommand>,
    pub certificates: Arc<dyn CertificateQuery>,
    pub certificates_command: Arc<dyn CertificateCommand>,
    pub analytics: Arc<dyn AnalyticsQuery>,
    pub webhooks: WebhookVerifiers,
    /// Time source for webhook timestamp checks.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from the ports bundle, verifiers and clock.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use academy_backend::inbound::http::state::{HttpState, HttpStatePorts, WebhookVerifiers};
    /// use mockable::DefaultClock;
    ///
    /// fn build(ports: HttpStatePorts) -> HttpState {
    ///     HttpState::new(ports, WebhookVerifiers::default(), Arc::new(DefaultClock))
    /// }
    /// ```
    pub fn new(ports: HttpStatePorts, webhooks: WebhookVerifiers, clock: Arc<dyn Clock>) -> Self {
        let HttpStatePorts {
            users,
            users_command,
            courses,
            courses_command,
            enrollments,
            enrollments_command,
            payments,
            payments_command,
            certificates,
            certificates_command,
            analytics,
        } = ports;
        Self {
            users,
            users_command,
            courses,
            courses_command,
            enrollments,
            enrollments_command,
            payments,
            payments_command,
            certificates,
            certificates_command,
            analytics,
            webhooks,
            clock,
        }
    }
}

//! Builders for the HTTP state over either storage backend.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use academy_backend::inbound::http::state::{HttpState, HttpStatePorts, Repositories};
use academy_backend::outbound::memory::MemoryStore;
use academy_backend::outbound::payments::LocalPaymentGateway;
use academy_backend::outbound::pdf::PdfCertificateRenderer;
use academy_backend::outbound::persistence::{
    DbPool, DieselAnalyticsRepository, DieselCertificateRepository, DieselCourseRepository,
    DieselEnrollmentRepository, DieselPaymentRepository, DieselUserRepository,
};

use super::ServerConfig;

fn diesel_ports(
    pool: &DbPool,
    gateway: LocalPaymentGateway,
    clock: Arc<dyn Clock>,
) -> HttpStatePorts {
    HttpStatePorts::from_repositories(
        Repositories {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            courses: Arc::new(DieselCourseRepository::new(pool.clone())),
            enrollments: Arc::new(DieselEnrollmentRepository::new(pool.clone())),
            payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
            certificates: Arc::new(DieselCertificateRepository::new(pool.clone())),
            analytics: Arc::new(DieselAnalyticsRepository::new(pool.clone())),
        },
        Arc::new(gateway),
        Arc::new(PdfCertificateRenderer),
        clock,
    )
}

fn memory_ports(gateway: LocalPaymentGateway, clock: Arc<dyn Clock>) -> HttpStatePorts {
    let store = Arc::new(MemoryStore::new());
    HttpStatePorts::from_repositories(
        Repositories {
            users: store.clone(),
            courses: store.clone(),
            enrollments: store.clone(),
            payments: store.clone(),
            certificates: store.clone(),
            analytics: store,
        },
        Arc::new(gateway),
        Arc::new(PdfCertificateRenderer),
        clock,
    )
}

/// Build HTTP state from the server configuration.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let gateway = LocalPaymentGateway::new(config.checkout_base_url.clone());
    let ports = match &config.db_pool {
        Some(pool) => diesel_ports(pool, gateway, clock.clone()),
        None => memory_ports(gateway, clock.clone()),
    };
    web::Data::new(HttpState::new(ports, config.webhooks.clone(), clock))
}

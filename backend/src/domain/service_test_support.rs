//! Shared fixtures for service unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::{
    Course, EmailAddress, Enrollment, EnrollmentRecord, EnrollmentStatus, IdentityProfile,
    NewCourse, Progress, User,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn sample_user(email: &str) -> User {
    User::register(
        IdentityProfile {
            external_id: format!("idp_{email}"),
            email: EmailAddress::new(email).expect("valid email"),
            first_name: Some("Grace".to_owned()),
            last_name: Some("Hopper".to_owned()),
            image_url: None,
        },
        fixture_timestamp(),
    )
    .expect("valid user")
}

pub(crate) fn sample_course(instructor_id: Uuid, price_cents: i64) -> Course {
    Course::create(
        NewCourse {
            title: "Compilers".to_owned(),
            slug: "compilers".to_owned(),
            description: "Parsing and code generation".to_owned(),
            short_description: None,
            price_cents,
            currency: None,
            image_url: None,
            instructor_id,
            keywords: vec!["compilers".to_owned()],
        },
        fixture_timestamp(),
    )
    .expect("valid course")
}

pub(crate) fn enrollment_with(status: EnrollmentStatus, progress: u8) -> Enrollment {
    let enrolled_at = fixture_timestamp();
    Enrollment::from_record(EnrollmentRecord {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        status,
        progress: Progress::new(i64::from(progress)).expect("valid progress"),
        enrolled_at,
        completed_at: (status == EnrollmentStatus::Completed).then_some(enrolled_at),
        updated_at: enrolled_at,
    })
}

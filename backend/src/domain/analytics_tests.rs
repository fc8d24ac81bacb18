//! Tests for dashboard and revenue rollups.

use chrono::TimeZone;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{EmailAddress, IdentityProfile, NewCourse};

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn user(email: &str, created_at: DateTime<Utc>) -> User {
    User::register(
        IdentityProfile {
            external_id: format!("ext_{email}"),
            email: EmailAddress::new(email).expect("valid email"),
            first_name: Some("Grace".to_owned()),
            last_name: Some("Hopper".to_owned()),
            image_url: None,
        },
        created_at,
    )
    .expect("valid user")
}

fn course(title: &str, slug: &str, instructor: Uuid) -> Course {
    Course::create(
        NewCourse {
            title: title.to_owned(),
            slug: slug.to_owned(),
            description: String::new(),
            short_description: None,
            price_cents: 10_000,
            currency: None,
            image_url: None,
            instructor_id: instructor,
            keywords: Vec::new(),
        },
        at(1, 1),
    )
    .expect("valid course")
}

fn paid(enrollment: &Enrollment, amount_cents: i64, created_at: DateTime<Utc>) -> Payment {
    let mut payment = Payment::pending_checkout(
        enrollment,
        amount_cents,
        Currency::default(),
        format!("cs_{}", enrollment.id()),
        created_at,
    );
    payment.apply_success(Some(format!("pi_{}", enrollment.id())), None, created_at);
    payment
}

struct Fixture {
    snapshot: AnalyticsSnapshot,
    rust: Uuid,
    go: Uuid,
    student: Uuid,
}

#[fixture]
fn fixture() -> Fixture {
    let instructor = user("teacher@example.com", at(1, 1));
    let student = user("student@example.com", at(6, 20));
    let other = user("other@example.com", at(2, 3));
    let rust = course("Rust", "rust", instructor.id);
    let go = course("Go", "go", instructor.id);

    let mut completed = Enrollment::new_active(student.id, rust.id, at(6, 21));
    completed
        .apply_progress(Progress::COMPLETE, at(6, 25))
        .expect("complete");
    let active = Enrollment::new_active(other.id, rust.id, at(3, 1));
    let pending = Enrollment::new_pending(student.id, go.id, at(6, 28));

    let payments = vec![
        paid(&completed, 10_000, at(6, 21)),
        paid(&active, 5_000, at(6, 22)),
        Payment::pending_checkout(&pending, 10_000, Currency::default(), "cs_pending", at(6, 28)),
    ];

    Fixture {
        rust: rust.id,
        go: go.id,
        student: student.id,
        snapshot: AnalyticsSnapshot {
            users: vec![instructor, student, other],
            lesson_counts: HashMap::from([(rust.id, 4)]),
            courses: vec![rust, go],
            enrollments: vec![completed, active, pending],
            payments,
            certificates: Vec::new(),
        },
    }
}

#[rstest]
fn dashboard_overview(fixture: Fixture) {
    let report = dashboard(&fixture.snapshot, at(7, 1));
    assert_eq!(report.overview.total_users, 3);
    assert_eq!(report.overview.total_enrollments, 3);
    assert_eq!(report.overview.completed_enrollments, 1);
    assert_eq!(report.overview.total_revenue_cents, 15_000);
    assert_eq!(report.overview.completion_rate, 33);
    assert_eq!(report.overview.payment_success_rate, 67);
    assert_eq!(report.recent_activity.new_users_last_30_days, 1);
    assert_eq!(report.recent_activity.new_enrollments_last_30_days, 2);
}

#[rstest]
fn dashboard_monthly_series_covers_year(fixture: Fixture) {
    let report = dashboard(&fixture.snapshot, at(7, 1));
    assert_eq!(report.monthly_stats.len(), 12);
    let june = &report.monthly_stats[5];
    assert_eq!(june.month_name, "June");
    assert_eq!(june.payments, 2);
    assert_eq!(june.revenue_cents, 15_000);
    assert_eq!(report.monthly_stats[0].month_name, "January");
}

#[rstest]
fn course_report_counts_revenue_and_lessons(fixture: Fixture) {
    let report = course_analytics(&fixture.snapshot, fixture.rust).expect("course present");
    assert_eq!(report.course.total_lessons, 4);
    assert_eq!(report.enrollment_stats.total, 2);
    assert_eq!(report.revenue.total_revenue_cents, 15_000);
    assert_eq!(report.revenue.average_revenue_per_student_cents, 7_500);
    assert_eq!(report.recent_enrollments[0].enrolled_at, at(6, 21));
    assert!(course_analytics(&fixture.snapshot, Uuid::new_v4()).is_none());
}

#[rstest]
fn user_report_sums_spend(fixture: Fixture) {
    let report = user_analytics(&fixture.snapshot, fixture.student).expect("user present");
    assert_eq!(report.financials.total_spent_cents, 10_000);
    assert_eq!(report.financials.average_course_price_cents, 5_000);
    assert_eq!(report.recent_activity.len(), 2);
    assert_eq!(report.user.name, "Grace Hopper");
}

#[rstest]
fn popular_courses_rank_by_enrollments(fixture: Fixture) {
    let ranked = popular_courses(&fixture.snapshot, 10);
    assert_eq!(ranked[0].id, fixture.rust);
    assert_eq!(ranked[0].completions, 1);
    assert_eq!(ranked[0].average_progress, 100);
    assert_eq!(ranked[1].id, fixture.go);
    assert_eq!(popular_courses(&fixture.snapshot, 1).len(), 1);
}

#[rstest]
fn revenue_report_groups_by_day(fixture: Fixture) {
    let report = revenue_report(&fixture.snapshot, RevenuePeriod::Month, at(7, 1));
    assert_eq!(report.summary.total_payments, 2);
    assert_eq!(report.summary.average_order_value_cents, 7_500);
    let days: Vec<NaiveDate> = report.daily_revenue.iter().map(|d| d.date).collect();
    assert_eq!(days, vec![at(6, 21).date_naive(), at(6, 22).date_naive()]);
    assert_eq!(report.top_courses.len(), 1);
    assert_eq!(report.top_courses[0].course_name, "Rust");
}

#[rstest]
fn revenue_window_excludes_older_payments(fixture: Fixture) {
    let report = revenue_report(&fixture.snapshot, RevenuePeriod::Week, at(6, 29));
    assert_eq!(report.summary.total_payments, 1);
    assert_eq!(report.summary.total_revenue_cents, 5_000);
    let report = revenue_report(&fixture.snapshot, RevenuePeriod::Week, at(7, 20));
    assert_eq!(report.summary.total_payments, 0);
    assert_eq!(report.summary.average_order_value_cents, 0);
}

#[rstest]
#[case("7d", Ok(RevenuePeriod::Week))]
#[case("1y", Ok(RevenuePeriod::Year))]
#[case("2w", Err(UnknownPeriod { value: "2w".to_owned() }))]
fn period_parsing(#[case] raw: &str, #[case] expected: Result<RevenuePeriod, UnknownPeriod>) {
    assert_eq!(raw.parse::<RevenuePeriod>(), expected);
}

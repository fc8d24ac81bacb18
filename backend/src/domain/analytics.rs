//! Read-only rollups for dashboards.
//!
//! Every report is a pure function over an [`AnalyticsSnapshot`], so the
//! arithmetic is tested without storage. Percentages are whole numbers and
//! fall back to 0 when nothing is counted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Month, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::certificate::{Certificate, CertificateNumber};
use super::course::Course;
use super::enrollment::{Enrollment, EnrollmentStats, EnrollmentStatus, Progress, rounded_mean};
use super::money::{Currency, percentage};
use super::payment::{Payment, PaymentStatus};
use super::user::User;

/// Number of entries in "recent" lists.
const RECENT_LIMIT: usize = 10;
/// Number of courses in the revenue leaderboard.
const TOP_COURSES: usize = 10;

/// Everything the reports read, loaded in one pass.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsSnapshot {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    /// Lesson count per course id; absent courses have none.
    pub lesson_counts: HashMap<Uuid, u64>,
    pub enrollments: Vec<Enrollment>,
    pub payments: Vec<Payment>,
    pub certificates: Vec<Certificate>,
}

impl AnalyticsSnapshot {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn course(&self, id: Uuid) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == id)
    }

    fn succeeded_payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(|payment| payment.status == PaymentStatus::Succeeded)
    }
}

/// Half-up rounded average in minor units; 0 for an empty set.
fn average_cents(total: i64, count: u64) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = i128::from(count);
    let avg = (2 * i128::from(total) + count) / (2 * count);
    i64::try_from(avg).unwrap_or(i64::MAX)
}

fn as_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_users: u64,
    pub total_courses: u64,
    pub total_enrollments: u64,
    pub total_payments: u64,
    pub total_certificates: u64,
    pub active_enrollments: u64,
    pub completed_enrollments: u64,
    pub successful_payments: u64,
    pub total_revenue_cents: i64,
    pub completion_rate: u32,
    pub payment_success_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub new_users_last_30_days: u64,
    pub new_enrollments_last_30_days: u64,
    pub new_payments_last_30_days: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: u32,
    pub month_name: String,
    pub users: u64,
    pub enrollments: u64,
    pub payments: u64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: DashboardOverview,
    pub recent_activity: RecentActivity,
    pub monthly_stats: Vec<MonthlyStat>,
}

/// Platform-wide dashboard at `now`.
pub fn dashboard(snapshot: &AnalyticsSnapshot, now: DateTime<Utc>) -> Dashboard {
    let enrollment_stats = EnrollmentStats::from_enrollments(&snapshot.enrollments);
    let successful_payments = as_count(snapshot.succeeded_payments().count());
    let total_payments = as_count(snapshot.payments.len());
    let overview = DashboardOverview {
        total_users: as_count(snapshot.users.len()),
        total_courses: as_count(snapshot.courses.len()),
        total_enrollments: enrollment_stats.total,
        total_payments,
        total_certificates: as_count(snapshot.certificates.len()),
        active_enrollments: enrollment_stats.active,
        completed_enrollments: enrollment_stats.completed,
        successful_payments,
        total_revenue_cents: snapshot.succeeded_payments().map(|p| p.amount_cents).sum(),
        completion_rate: enrollment_stats.completion_rate,
        payment_success_rate: percentage(successful_payments, total_payments),
    };

    let since = now - Duration::days(30);
    let recent_activity = RecentActivity {
        new_users_last_30_days: as_count(
            snapshot.users.iter().filter(|u| u.created_at >= since).count(),
        ),
        new_enrollments_last_30_days: as_count(
            snapshot
                .enrollments
                .iter()
                .filter(|e| e.enrolled_at() >= since)
                .count(),
        ),
        new_payments_last_30_days: as_count(
            snapshot.payments.iter().filter(|p| p.created_at >= since).count(),
        ),
    };

    Dashboard {
        overview,
        recent_activity,
        monthly_stats: monthly_stats(snapshot, now.year()),
    }
}

fn monthly_stats(snapshot: &AnalyticsSnapshot, year: i32) -> Vec<MonthlyStat> {
    let in_month =
        |at: DateTime<Utc>, month: u32| at.year() == year && at.month() == month;
    (1_u8..=12)
        .map(|month_number| {
            let month = u32::from(month_number);
            let month_name = Month::try_from(month_number)
                .map(|m| m.name().to_owned())
                .unwrap_or_default();
            let paid: Vec<&Payment> = snapshot
                .succeeded_payments()
                .filter(|p| in_month(p.created_at, month))
                .collect();
            MonthlyStat {
                month,
                month_name,
                users: as_count(
                    snapshot
                        .users
                        .iter()
                        .filter(|u| in_month(u.created_at, month))
                        .count(),
                ),
                enrollments: as_count(
                    snapshot
                        .enrollments
                        .iter()
                        .filter(|e| in_month(e.enrolled_at(), month))
                        .count(),
                ),
                payments: as_count(paid.len()),
                revenue_cents: paid.iter().map(|p| p.amount_cents).sum(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub currency: Currency,
    pub total_lessons: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub image_url: Option<String>,
}

impl From<&Course> for CourseRef {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            slug: course.slug.clone(),
            image_url: course.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEnrollment {
    pub id: Uuid,
    pub user: Option<StudentRef>,
    pub status: EnrollmentStatus,
    pub progress: Progress,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRevenue {
    pub total_revenue_cents: i64,
    pub average_revenue_per_student_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnalytics {
    pub course: CourseSummary,
    pub enrollment_stats: EnrollmentStats,
    pub revenue: CourseRevenue,
    pub recent_enrollments: Vec<StudentEnrollment>,
}

fn newest_first<'a>(enrollments: impl Iterator<Item = &'a Enrollment>) -> Vec<&'a Enrollment> {
    let mut sorted: Vec<&Enrollment> = enrollments.collect();
    sorted.sort_by_key(|e| std::cmp::Reverse(e.enrolled_at()));
    sorted
}

/// Per-course report; `None` when the course is not in the snapshot.
pub fn course_analytics(snapshot: &AnalyticsSnapshot, course_id: Uuid) -> Option<CourseAnalytics> {
    let course = snapshot.course(course_id)?;
    let enrollments: Vec<&Enrollment> = snapshot
        .enrollments
        .iter()
        .filter(|e| e.course_id() == course_id)
        .collect();
    let enrollment_stats = EnrollmentStats::from_enrollments(enrollments.iter().copied());
    let total_revenue_cents: i64 = snapshot
        .succeeded_payments()
        .filter(|p| p.course_id == course_id)
        .map(|p| p.amount_cents)
        .sum();

    let recent_enrollments = newest_first(enrollments.iter().copied())
        .into_iter()
        .take(RECENT_LIMIT)
        .map(|enrollment| StudentEnrollment {
            id: enrollment.id(),
            user: snapshot.user(enrollment.user_id()).map(|user| StudentRef {
                id: user.id,
                name: user.display_name(),
                email: user.email.to_string(),
            }),
            status: enrollment.status(),
            progress: enrollment.progress(),
            enrolled_at: enrollment.enrolled_at(),
            completed_at: enrollment.completed_at(),
        })
        .collect();

    Some(CourseAnalytics {
        course: CourseSummary {
            id: course.id,
            title: course.title.clone(),
            price_cents: course.price_cents,
            currency: course.currency.clone(),
            total_lessons: snapshot.lesson_counts.get(&course_id).copied().unwrap_or(0),
        },
        revenue: CourseRevenue {
            total_revenue_cents,
            average_revenue_per_student_cents: average_cents(
                total_revenue_cents,
                enrollment_stats.total,
            ),
        },
        enrollment_stats,
        recent_enrollments,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEnrollmentStats {
    #[serde(flatten)]
    pub enrollments: EnrollmentStats,
    pub certificates: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFinancials {
    pub total_spent_cents: i64,
    pub average_course_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollment {
    pub id: Uuid,
    pub course: Option<CourseRef>,
    pub status: EnrollmentStatus,
    pub progress: Progress,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedCertificate {
    pub id: Uuid,
    pub certificate_number: CertificateNumber,
    pub issued_at: DateTime<Utc>,
    pub course: Option<CourseRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub user: UserSummary,
    pub enrollment_stats: UserEnrollmentStats,
    pub financials: UserFinancials,
    pub recent_activity: Vec<CourseEnrollment>,
    pub certificates: Vec<EarnedCertificate>,
}

/// Per-user report; `None` when the user is not in the snapshot.
pub fn user_analytics(snapshot: &AnalyticsSnapshot, user_id: Uuid) -> Option<UserAnalytics> {
    let user = snapshot.user(user_id)?;
    let enrollments: Vec<&Enrollment> = snapshot
        .enrollments
        .iter()
        .filter(|e| e.user_id() == user_id)
        .collect();
    let certificates: Vec<&Certificate> = snapshot
        .certificates
        .iter()
        .filter(|c| c.user_id == user_id)
        .collect();
    let stats = EnrollmentStats::from_enrollments(enrollments.iter().copied());
    let total_spent_cents: i64 = snapshot
        .succeeded_payments()
        .filter(|p| p.user_id == user_id)
        .map(|p| p.amount_cents)
        .sum();

    let recent_activity = newest_first(enrollments.iter().copied())
        .into_iter()
        .take(RECENT_LIMIT)
        .map(|enrollment| CourseEnrollment {
            id: enrollment.id(),
            course: snapshot.course(enrollment.course_id()).map(CourseRef::from),
            status: enrollment.status(),
            progress: enrollment.progress(),
            enrolled_at: enrollment.enrolled_at(),
            completed_at: enrollment.completed_at(),
        })
        .collect();

    Some(UserAnalytics {
        user: UserSummary {
            id: user.id,
            name: user.display_name(),
            email: user.email.to_string(),
            joined_at: user.created_at,
        },
        enrollment_stats: UserEnrollmentStats {
            enrollments: stats,
            certificates: as_count(certificates.len()),
        },
        financials: UserFinancials {
            total_spent_cents,
            average_course_price_cents: average_cents(total_spent_cents, stats.total),
        },
        recent_activity,
        certificates: certificates
            .into_iter()
            .map(|certificate| EarnedCertificate {
                id: certificate.id,
                certificate_number: certificate.certificate_number.clone(),
                issued_at: certificate.issued_at,
                course: snapshot.course(certificate.course_id).map(CourseRef::from),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularCourse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub currency: Currency,
    pub total_enrollments: u64,
    pub completions: u64,
    pub average_progress: u32,
}

/// Courses ranked by enrollment count, ties broken by title.
pub fn popular_courses(snapshot: &AnalyticsSnapshot, limit: usize) -> Vec<PopularCourse> {
    let mut ranked: Vec<PopularCourse> = snapshot
        .courses
        .iter()
        .map(|course| {
            let enrollments = snapshot
                .enrollments
                .iter()
                .filter(|e| e.course_id() == course.id);
            let mut total = 0_u64;
            let mut completions = 0_u64;
            let mut completed_progress = 0_u64;
            for enrollment in enrollments {
                total += 1;
                if enrollment.status() == EnrollmentStatus::Completed {
                    completions += 1;
                    completed_progress += u64::from(enrollment.progress().value());
                }
            }
            PopularCourse {
                id: course.id,
                title: course.title.clone(),
                slug: course.slug.clone(),
                image_url: course.image_url.clone(),
                price_cents: course.price_cents,
                currency: course.currency.clone(),
                total_enrollments: total,
                completions,
                average_progress: rounded_mean(completed_progress, completions),
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_enrollments
            .cmp(&a.total_enrollments)
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked.truncate(limit);
    ranked
}

/// Raised for an unrecognised revenue window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("period must be one of 7d, 30d, 90d, 1y; got {value:?}")]
pub struct UnknownPeriod {
    pub value: String,
}

/// Look-back window for revenue reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenuePeriod {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl RevenuePeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
        }
    }

    /// Inclusive start of the window ending at `now`.
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
            Self::Quarter => now - Duration::days(90),
            Self::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(now - Duration::days(365)),
        }
    }
}

impl fmt::Display for RevenuePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevenuePeriod {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            "1y" => Ok(Self::Year),
            other => Err(UnknownPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_revenue_cents: i64,
    pub total_payments: u64,
    pub average_order_value_cents: i64,
    pub period: RevenuePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRevenueRank {
    pub course_id: Uuid,
    pub course_name: String,
    pub revenue_cents: i64,
    pub payments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub summary: RevenueSummary,
    pub daily_revenue: Vec<DailyRevenue>,
    pub top_courses: Vec<CourseRevenueRank>,
}

/// Revenue from successful payments created inside `period`.
pub fn revenue_report(
    snapshot: &AnalyticsSnapshot,
    period: RevenuePeriod,
    now: DateTime<Utc>,
) -> RevenueReport {
    let start = period.start(now);
    let paid: Vec<&Payment> = snapshot
        .succeeded_payments()
        .filter(|p| p.created_at >= start)
        .collect();
    let total_revenue_cents: i64 = paid.iter().map(|p| p.amount_cents).sum();
    let total_payments = as_count(paid.len());

    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut by_course: HashMap<Uuid, (i64, u64)> = HashMap::new();
    for payment in &paid {
        *by_day.entry(payment.created_at.date_naive()).or_default() += payment.amount_cents;
        let entry = by_course.entry(payment.course_id).or_default();
        entry.0 += payment.amount_cents;
        entry.1 += 1;
    }

    let mut top_courses: Vec<CourseRevenueRank> = by_course
        .into_iter()
        .map(|(course_id, (revenue_cents, payments))| CourseRevenueRank {
            course_id,
            course_name: snapshot
                .course(course_id)
                .map(|c| c.title.clone())
                .unwrap_or_default(),
            revenue_cents,
            payments,
        })
        .collect();
    top_courses.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.course_name.cmp(&b.course_name))
    });
    top_courses.truncate(TOP_COURSES);

    RevenueReport {
        summary: RevenueSummary {
            total_revenue_cents,
            total_payments,
            average_order_value_cents: average_cents(total_revenue_cents, total_payments),
            period,
        },
        daily_revenue: by_day
            .into_iter()
            .map(|(date, revenue_cents)| DailyRevenue {
                date,
                revenue_cents,
            })
            .collect(),
        top_courses,
    }
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;

//! In-memory store implementing every repository port.
//!
//! A single `tokio::sync::RwLock` guards the whole state. Each multi-step
//! operation (progress updates, lesson completion, reconciliation, refunds,
//! certificate issuance) holds the write guard from first read to last write
//! and only commits cloned entities once every check has passed, so a
//! rejected operation leaves nothing behind.
//!
//! Used by the test suites and by local runs without a database URL.

mod analytics;
mod certificates;
mod courses;
mod enrollments;
mod payments;
mod users;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Certificate, Course, Enrollment, Lesson, LessonProgress, LessonTally, Payment, User,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    courses: HashMap<Uuid, Course>,
    lessons: HashMap<Uuid, Lesson>,
    enrollments: HashMap<Uuid, Enrollment>,
    /// Keyed by `(enrollment_id, lesson_id)`.
    lesson_progress: HashMap<(Uuid, Uuid), LessonProgress>,
    payments: HashMap<Uuid, Payment>,
    certificates: HashMap<Uuid, Certificate>,
    /// Last issued certificate sequence per `IssuancePeriod::key`.
    certificate_sequences: HashMap<String, u32>,
}

impl State {
    fn tally(&self, enrollment: &Enrollment) -> LessonTally {
        let course_id = enrollment.course_id();
        let total = self
            .lessons
            .values()
            .filter(|lesson| lesson.course_id == course_id)
            .count();
        let completed = self
            .lesson_progress
            .values()
            .filter(|marker| marker.enrollment_id == enrollment.id() && marker.completed)
            .filter(|marker| {
                self.lessons
                    .get(&marker.lesson_id)
                    .is_some_and(|lesson| lesson.course_id == course_id)
            })
            .count();
        LessonTally {
            completed: as_count(completed),
            total: as_count(total),
        }
    }

    /// Drop an enrollment with its lesson progress, payment and certificate.
    fn purge_enrollment(&mut self, id: Uuid) -> bool {
        if self.enrollments.remove(&id).is_none() {
            return false;
        }
        self.lesson_progress
            .retain(|(enrollment_id, _), _| *enrollment_id != id);
        self.payments
            .retain(|_, payment| payment.enrollment_id != id);
        self.certificates
            .retain(|_, certificate| certificate.enrollment_id != id);
        true
    }

    fn purge_enrollments_where(&mut self, predicate: impl Fn(&Enrollment) -> bool) {
        let doomed: Vec<Uuid> = self
            .enrollments
            .values()
            .filter(|enrollment| predicate(enrollment))
            .map(Enrollment::id)
            .collect();
        for id in doomed {
            self.purge_enrollment(id);
        }
    }
}

/// Shared handle to the in-memory state. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn as_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Sort descending by `(timestamp, id)` so ties stay deterministic.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[cfg(test)]
mod tests;

//! Enrollment lifecycle: status machine, progress, and lesson completion.
//!
//! An [`Enrollment`] links one user to one course. Its status moves through
//! a small state machine:
//!
//! ```text
//! PENDING ──► ACTIVE ──► COMPLETED
//!    │          │
//!    └──────────┴──────► CANCELLED
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal. `completed_at` is present
//! exactly when the status is `COMPLETED`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::percentage;

/// Rejected enrollment state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentTransitionError {
    #[error("progress must be between 0 and 100, got {value}")]
    ProgressOutOfRange { value: i64 },
    #[error("progress can only change on ACTIVE or COMPLETED enrollments, not {status}")]
    NotInProgress { status: EnrollmentStatus },
    #[error("enrollment cannot move from {from} to {to}")]
    IllegalTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },
    #[error("a COMPLETED enrollment must have progress 100, got {value}")]
    CompletedBelowFullProgress { value: u8 },
    #[error("enrollment status must be PENDING, ACTIVE, COMPLETED or CANCELLED")]
    UnknownStatus,
}

/// Lifecycle state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    /// Awaiting payment confirmation.
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// `true` for states with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// `true` when learning progress may be recorded.
    pub fn accepts_progress(self) -> bool {
        matches!(self, Self::Active | Self::Completed)
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = EnrollmentTransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(EnrollmentTransitionError::UnknownStatus),
        }
    }
}

/// Course progress as a whole percentage in `0..=100`.
///
/// # Examples
/// ```
/// use academy_backend::domain::Progress;
///
/// assert_eq!(Progress::new(42).expect("in range").value(), 42);
/// assert!(Progress::new(101).is_err());
/// assert!(Progress::new(100).expect("in range").is_complete());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Self = Self(0);
    pub const COMPLETE: Self = Self(100);

    /// Validate a raw percentage. Out-of-range values are rejected, never
    /// clamped.
    pub fn new(value: i64) -> Result<Self, EnrollmentTransitionError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(EnrollmentTransitionError::ProgressOutOfRange { value })
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self.0 >= 100
    }
}

impl TryFrom<i64> for Progress {
    type Error = EnrollmentTransitionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for u8 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

/// Completed-versus-total lesson counts for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonTally {
    pub completed: u64,
    pub total: u64,
}

impl LessonTally {
    /// Rounded completion percentage; a course without lessons stays at 0.
    pub fn progress(self) -> Progress {
        let pct = percentage(self.completed.min(self.total), self.total);
        Progress(u8::try_from(pct.min(100)).unwrap_or(100))
    }

    /// Every lesson is done and the course has at least one.
    pub fn is_complete(self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Stored enrollment fields, used by adapters to rehydrate an
/// [`Enrollment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub progress: Progress,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A user's enrollment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    status: EnrollmentStatus,
    progress: Progress,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Direct enrollment: ACTIVE with no progress.
    pub fn new_active(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::fresh(user_id, course_id, EnrollmentStatus::Active, now)
    }

    /// Payment-gated enrollment awaiting checkout.
    pub fn new_pending(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::fresh(user_id, course_id, EnrollmentStatus::Pending, now)
    }

    fn fresh(user_id: Uuid, course_id: Uuid, status: EnrollmentStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            status,
            progress: Progress::ZERO,
            enrolled_at: now,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Rebuild from storage. A completion stamp on a non-completed row is
    /// dropped.
    pub fn from_record(record: EnrollmentRecord) -> Self {
        let completed_at = match record.status {
            EnrollmentStatus::Completed => record.completed_at.or(Some(record.updated_at)),
            _ => None,
        };
        Self {
            id: record.id,
            user_id: record.user_id,
            course_id: record.course_id,
            status: record.status,
            progress: record.progress,
            enrolled_at: record.enrolled_at,
            completed_at,
            updated_at: record.updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn ensure_in_progress(&self) -> Result<(), EnrollmentTransitionError> {
        if self.status.accepts_progress() {
            Ok(())
        } else {
            Err(EnrollmentTransitionError::NotInProgress {
                status: self.status,
            })
        }
    }

    fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = EnrollmentStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Record an explicit progress value.
    ///
    /// Reaching 100 completes the enrollment and stamps `completed_at`,
    /// overwriting an earlier stamp if already completed. Lower values on a
    /// completed enrollment update the number only.
    pub fn apply_progress(
        &mut self,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Result<(), EnrollmentTransitionError> {
        self.ensure_in_progress()?;
        self.progress = progress;
        if progress.is_complete() {
            self.mark_completed(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Recompute progress from lesson counts. Completion is stamped once.
    pub fn apply_lesson_tally(
        &mut self,
        tally: LessonTally,
        now: DateTime<Utc>,
    ) -> Result<(), EnrollmentTransitionError> {
        self.ensure_in_progress()?;
        self.progress = tally.progress();
        if tally.is_complete() && self.status != EnrollmentStatus::Completed {
            self.mark_completed(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Administrative status change along a state-machine edge.
    ///
    /// Re-asserting the current status is a no-op and returns `Ok(false)`.
    /// Completing this way also sets progress to 100.
    pub fn transition_to(
        &mut self,
        next: EnrollmentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, EnrollmentTransitionError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(EnrollmentTransitionError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        if next == EnrollmentStatus::Completed {
            self.progress = Progress::COMPLETE;
            self.mark_completed(now);
        } else {
            self.status = next;
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Payment confirmed: PENDING becomes ACTIVE. Any other status is left
    /// alone; returns whether anything changed.
    pub fn activate_after_payment(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != EnrollmentStatus::Pending {
            return false;
        }
        self.status = EnrollmentStatus::Active;
        self.updated_at = now;
        true
    }

    /// Payment failed or refunded: non-terminal enrollments are cancelled.
    /// Returns whether anything changed.
    pub fn cancel_after_payment(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = EnrollmentStatus::Cancelled;
        self.updated_at = now;
        true
    }
}

/// Per-lesson completion marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LessonProgress {
    pub fn completed(enrollment_id: Uuid, lesson_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            enrollment_id,
            lesson_id,
            completed: true,
            completed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark complete again, keeping the first completion time.
    pub fn recomplete(&mut self, now: DateTime<Utc>) {
        if !self.completed || self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.completed = true;
        self.updated_at = now;
    }
}

/// Result of completing a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    pub lesson_progress: LessonProgress,
    pub enrollment: Enrollment,
}

/// Counts and averages over a set of enrollments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub average_progress: u32,
    pub completion_rate: u32,
}

impl EnrollmentStats {
    pub fn from_enrollments<'a>(enrollments: impl IntoIterator<Item = &'a Enrollment>) -> Self {
        let mut stats = Self::default();
        let mut progress_sum = 0_u64;
        for enrollment in enrollments {
            stats.total += 1;
            progress_sum += u64::from(enrollment.progress.value());
            match enrollment.status {
                EnrollmentStatus::Pending => stats.pending += 1,
                EnrollmentStatus::Active => stats.active += 1,
                EnrollmentStatus::Completed => stats.completed += 1,
                EnrollmentStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats.average_progress = rounded_mean(progress_sum, stats.total);
        stats.completion_rate = percentage(stats.completed, stats.total);
        stats
    }
}

/// Half-up rounded mean; 0 for an empty set.
pub(crate) fn rounded_mean(sum: u64, count: u64) -> u32 {
    if count == 0 {
        return 0;
    }
    let mean = (2 * u128::from(sum) + u128::from(count)) / (2 * u128::from(count));
    u32::try_from(mean).unwrap_or(u32::MAX)
}

/// Per-enrollment lesson progress summary for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressSummary {
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub status: EnrollmentStatus,
    pub progress: Progress,
    pub completed_lessons: u64,
    pub total_lessons: u64,
    pub progress_percentage: Progress,
}

#[cfg(test)]
#[path = "enrollment_tests.rs"]
mod tests;

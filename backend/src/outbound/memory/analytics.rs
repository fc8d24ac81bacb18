use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::AnalyticsSnapshot;
use crate::domain::ports::{AnalyticsRepository, AnalyticsRepositoryError};

use super::MemoryStore;

#[async_trait]
impl AnalyticsRepository for MemoryStore {
    async fn load_snapshot(&self) -> Result<AnalyticsSnapshot, AnalyticsRepositoryError> {
        let state = self.state.read().await;
        let mut lesson_counts: HashMap<_, u64> = HashMap::new();
        for lesson in state.lessons.values() {
            *lesson_counts.entry(lesson.course_id).or_default() += 1;
        }
        Ok(AnalyticsSnapshot {
            users: state.users.values().cloned().collect(),
            courses: state.courses.values().cloned().collect(),
            lesson_counts,
            enrollments: state.enrollments.values().cloned().collect(),
            payments: state.payments.values().cloned().collect(),
            certificates: state.certificates.values().cloned().collect(),
        })
    }
}

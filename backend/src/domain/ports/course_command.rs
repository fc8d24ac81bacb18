//! Driving port for catalogue changes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Course, CourseUpdate, Error, Lesson, LessonUpdate, NewCourse, NewLesson};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseCommand: Send + Sync {
    /// Create a DRAFT course for an existing instructor.
    async fn create(&self, input: NewCourse) -> Result<Course, Error>;

    async fn update(&self, id: Uuid, update: CourseUpdate) -> Result<Course, Error>;

    /// Remove a course that nobody is enrolled in.
    async fn remove(&self, id: Uuid) -> Result<(), Error>;

    async fn create_lesson(&self, course_id: Uuid, input: NewLesson) -> Result<Lesson, Error>;

    async fn update_lesson(&self, id: Uuid, update: LessonUpdate) -> Result<Lesson, Error>;

    async fn delete_lesson(&self, id: Uuid) -> Result<(), Error>;
}

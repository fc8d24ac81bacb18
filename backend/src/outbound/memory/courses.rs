use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    CourseFilter, CourseRepository, CourseRepositoryError, CourseWithEnrollments,
};
use crate::domain::{Course, Lesson, PageRequest};

use super::{MemoryStore, State, as_count, newest_first};

fn by_creation(course: &Course) -> (DateTime<Utc>, Uuid) {
    (course.created_at, course.id)
}

fn ensure_slug_free(state: &State, course: &Course) -> Result<(), CourseRepositoryError> {
    let taken = state
        .courses
        .values()
        .any(|other| other.id != course.id && other.slug == course.slug);
    if taken {
        return Err(CourseRepositoryError::duplicate(format!(
            "slug {:?} is taken",
            course.slug
        )));
    }
    Ok(())
}

fn sorted_lessons(mut lessons: Vec<Lesson>) -> Vec<Lesson> {
    lessons.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    lessons
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(self.state.read().await.courses.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        Ok(state.courses.values().find(|c| c.slug == slug).cloned())
    }

    async fn list(
        &self,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| filter.matches(course))
            .cloned()
            .collect();
        newest_first(&mut courses, by_creation);
        Ok(page.apply(courses))
    }

    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.instructor_id == instructor_id)
            .cloned()
            .collect();
        newest_first(&mut courses, by_creation);
        Ok(courses)
    }

    async fn search_published(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.is_published() && course.matches_query(query))
            .cloned()
            .collect();
        newest_first(&mut courses, by_creation);
        courses.truncate(limit);
        Ok(courses)
    }

    async fn popular_published(
        &self,
        limit: usize,
    ) -> Result<Vec<CourseWithEnrollments>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for enrollment in state.enrollments.values() {
            *counts.entry(enrollment.course_id()).or_default() += 1;
        }
        let mut ranked: Vec<CourseWithEnrollments> = state
            .courses
            .values()
            .filter(|course| course.is_published())
            .map(|course| CourseWithEnrollments {
                enrollments: as_count(counts.get(&course.id).copied().unwrap_or_default()),
                course: course.clone(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.enrollments
                .cmp(&a.enrollments)
                .then_with(|| a.course.title.cmp(&b.course.title))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        ensure_slug_free(&state, course)?;
        state.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<bool, CourseRepositoryError> {
        let mut state = self.state.write().await;
        if !state.courses.contains_key(&course.id) {
            return Ok(false);
        }
        ensure_slug_free(&state, course)?;
        state.courses.insert(course.id, course.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CourseRepositoryError> {
        let mut state = self.state.write().await;
        if state.courses.remove(&id).is_none() {
            return Ok(false);
        }
        state.purge_enrollments_where(|enrollment| enrollment.course_id() == id);
        state.lessons.retain(|_, lesson| lesson.course_id != id);
        Ok(true)
    }

    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, CourseRepositoryError> {
        Ok(self.state.read().await.lessons.get(&id).cloned())
    }

    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, CourseRepositoryError> {
        let state = self.state.read().await;
        let lessons = state
            .lessons
            .values()
            .filter(|lesson| lesson.course_id == course_id)
            .cloned()
            .collect();
        Ok(sorted_lessons(lessons))
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        if !state.courses.contains_key(&lesson.course_id) {
            return Err(CourseRepositoryError::query(format!(
                "course {} does not exist",
                lesson.course_id
            )));
        }
        state.lessons.insert(lesson.id, lesson.clone());
        Ok(())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, CourseRepositoryError> {
        let mut state = self.state.write().await;
        match state.lessons.get_mut(&lesson.id) {
            Some(stored) => {
                *stored = lesson.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_lesson(&self, id: Uuid) -> Result<bool, CourseRepositoryError> {
        let mut state = self.state.write().await;
        if state.lessons.remove(&id).is_none() {
            return Ok(false);
        }
        state
            .lesson_progress
            .retain(|(_, lesson_id), _| *lesson_id != id);
        Ok(true)
    }
}

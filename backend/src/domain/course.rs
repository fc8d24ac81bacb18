//! Course catalogue entities: courses and their ordered lessons.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{Currency, InvalidCurrency};

/// Validation failures for course and lesson input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CourseValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("slug must be lower-case kebab-case, got {slug:?}")]
    InvalidSlug { slug: String },
    #[error("price must not be negative")]
    NegativePrice,
    #[error(transparent)]
    Currency(#[from] InvalidCurrency),
    #[error("lesson duration must not be negative")]
    NegativeDuration,
    #[error("course status must be DRAFT or PUBLISHED")]
    UnknownStatus,
}

/// Publication state of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
}

impl CourseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseStatus {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            _ => Err(CourseValidationError::UnknownStatus),
        }
    }
}

/// Slugs are lower-case ASCII words joined by single hyphens.
fn is_valid_slug(value: &str) -> bool {
    value.split('-').all(|word| {
        !word.is_empty()
            && word
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
    })
}

fn required_title(title: &str) -> Result<String, CourseValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CourseValidationError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

fn checked_slug(slug: &str) -> Result<String, CourseValidationError> {
    if is_valid_slug(slug) {
        Ok(slug.to_owned())
    } else {
        Err(CourseValidationError::InvalidSlug {
            slug: slug.to_owned(),
        })
    }
}

fn checked_price(price_cents: i64) -> Result<i64, CourseValidationError> {
    if price_cents < 0 {
        return Err(CourseValidationError::NegativePrice);
    }
    Ok(price_cents)
}

/// A sellable course owned by one instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price_cents: i64,
    pub currency: Currency,
    pub image_url: Option<String>,
    pub instructor_id: Uuid,
    pub status: CourseStatus,
    pub keywords: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Course::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price_cents: i64,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub instructor_id: Uuid,
    pub keywords: Vec<String>,
}

/// Partial course update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<CourseStatus>,
    pub keywords: Option<Vec<String>>,
}

impl Course {
    /// Validate input and build a draft course.
    pub fn create(input: NewCourse, now: DateTime<Utc>) -> Result<Self, CourseValidationError> {
        let currency = match input.currency {
            Some(code) => Currency::new(code)?,
            None => Currency::default(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            title: required_title(&input.title)?,
            slug: checked_slug(&input.slug)?,
            description: input.description,
            short_description: input.short_description,
            price_cents: checked_price(input.price_cents)?,
            currency,
            image_url: input.image_url,
            instructor_id: input.instructor_id,
            status: CourseStatus::Draft,
            keywords: normalise_keywords(input.keywords),
            published_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. The first move to PUBLISHED stamps
    /// `published_at`; later republishing keeps the original stamp.
    pub fn apply_update(
        &mut self,
        update: CourseUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), CourseValidationError> {
        if let Some(title) = update.title {
            self.title = required_title(&title)?;
        }
        if let Some(slug) = update.slug {
            self.slug = checked_slug(&slug)?;
        }
        if let Some(price_cents) = update.price_cents {
            self.price_cents = checked_price(price_cents)?;
        }
        if let Some(currency) = update.currency {
            self.currency = Currency::new(currency)?;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if update.short_description.is_some() {
            self.short_description = update.short_description;
        }
        if update.image_url.is_some() {
            self.image_url = update.image_url;
        }
        if let Some(keywords) = update.keywords {
            self.keywords = normalise_keywords(keywords);
        }
        if let Some(status) = update.status {
            if status == CourseStatus::Published && self.published_at.is_none() {
                self.published_at = Some(now);
            }
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    /// Case-insensitive match over title and descriptions, or an exact
    /// keyword hit.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        let text_hit = [
            Some(self.title.as_str()),
            Some(self.description.as_str()),
            self.short_description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle));
        text_hit || self.keywords.iter().any(|keyword| *keyword == needle)
    }
}

fn normalise_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

/// A unit of course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    /// Display order; neither unique nor gap-free.
    pub position: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub position: i32,
    pub is_preview: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub position: Option<i32>,
    pub is_preview: Option<bool>,
}

fn checked_duration(minutes: Option<i32>) -> Result<Option<i32>, CourseValidationError> {
    match minutes {
        Some(value) if value < 0 => Err(CourseValidationError::NegativeDuration),
        other => Ok(other),
    }
}

impl Lesson {
    pub fn create(
        course_id: Uuid,
        input: NewLesson,
        now: DateTime<Utc>,
    ) -> Result<Self, CourseValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            course_id,
            title: required_title(&input.title)?,
            content: input.content,
            video_url: input.video_url,
            duration_minutes: checked_duration(input.duration_minutes)?,
            position: input.position,
            is_preview: input.is_preview,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(
        &mut self,
        update: LessonUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), CourseValidationError> {
        if let Some(title) = update.title {
            self.title = required_title(&title)?;
        }
        if update.duration_minutes.is_some() {
            self.duration_minutes = checked_duration(update.duration_minutes)?;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if update.video_url.is_some() {
            self.video_url = update.video_url;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(is_preview) = update.is_preview {
            self.is_preview = is_preview;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// A course together with its lessons ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

impl CourseDetail {
    pub fn new(course: Course, mut lessons: Vec<Lesson>) -> Self {
        lessons.sort_by_key(|lesson| (lesson.position, lesson.created_at));
        Self { course, lessons }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn draft(now: DateTime<Utc>) -> Course {
        Course::create(
            NewCourse {
                title: "Rust for Backend Engineers".to_owned(),
                slug: "rust-backend".to_owned(),
                description: "Ownership, async, and Diesel".to_owned(),
                short_description: None,
                price_cents: 4_900,
                currency: None,
                image_url: None,
                instructor_id: Uuid::new_v4(),
                keywords: vec!["Rust".to_owned(), "rust".to_owned(), " async ".to_owned()],
            },
            now,
        )
        .expect("valid course")
    }

    #[rstest]
    #[case("rust-101", true)]
    #[case("rust", true)]
    #[case("Rust-101", false)]
    #[case("rust--101", false)]
    #[case("-rust", false)]
    #[case("rust 101", false)]
    #[case("", false)]
    fn slug_rules(#[case] slug: &str, #[case] valid: bool) {
        assert_eq!(is_valid_slug(slug), valid);
    }

    #[rstest]
    fn create_starts_as_draft_with_default_currency(draft: Course) {
        assert_eq!(draft.status, CourseStatus::Draft);
        assert_eq!(draft.currency.as_str(), "USD");
        assert_eq!(draft.keywords, vec!["rust".to_owned(), "async".to_owned()]);
        assert!(draft.published_at.is_none());
    }

    #[rstest]
    fn publishing_stamps_once(mut draft: Course, now: DateTime<Utc>) {
        let publish = CourseUpdate {
            status: Some(CourseStatus::Published),
            ..CourseUpdate::default()
        };
        draft.apply_update(publish.clone(), now).expect("publish");
        let later = now + Duration::days(3);
        draft
            .apply_update(
                CourseUpdate {
                    status: Some(CourseStatus::Draft),
                    ..CourseUpdate::default()
                },
                later,
            )
            .expect("unpublish");
        draft.apply_update(publish, later).expect("republish");
        assert_eq!(draft.published_at, Some(now));
        assert_eq!(draft.updated_at, later);
    }

    #[rstest]
    fn rejects_negative_price(mut draft: Course, now: DateTime<Utc>) {
        let result = draft.apply_update(
            CourseUpdate {
                price_cents: Some(-1),
                ..CourseUpdate::default()
            },
            now,
        );
        assert_eq!(result, Err(CourseValidationError::NegativePrice));
    }

    #[rstest]
    #[case("backend", true)]
    #[case("DIESEL", true)]
    #[case("async", true)]
    #[case("golang", false)]
    #[case("python", false)]
    fn query_matching(draft: Course, #[case] query: &str, #[case] expected: bool) {
        assert_eq!(draft.matches_query(query), expected);
    }

    #[rstest]
    fn detail_orders_lessons_by_position(draft: Course, now: DateTime<Utc>) {
        let lesson = |position| {
            Lesson::create(
                draft.id,
                NewLesson {
                    title: format!("Lesson {position}"),
                    content: String::new(),
                    video_url: None,
                    duration_minutes: Some(10),
                    position,
                    is_preview: false,
                },
                now,
            )
            .expect("valid lesson")
        };
        let detail = CourseDetail::new(draft.clone(), vec![lesson(3), lesson(1), lesson(2)]);
        let positions: Vec<i32> = detail.lessons.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }
}

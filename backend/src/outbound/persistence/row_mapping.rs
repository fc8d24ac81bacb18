//! Conversions between Diesel rows and domain entities.
//!
//! Decoding goes through the domain parsers, so a corrupt status or currency
//! surfaces as an error string instead of a silently defaulted value. Each
//! repository wraps the string in its own query error.

use crate::domain::{
    Certificate, CertificateNumber, Course, Currency, EmailAddress, Enrollment, EnrollmentRecord,
    Lesson, LessonProgress, Payment, Progress, User,
};

use super::models::{
    CertificateRow, CourseRecord, CourseRow, EnrollmentRow, EnrollmentStateUpdate,
    LessonProgressRow, LessonRecord, LessonRow, NewEnrollmentRow, PaymentRecord, PaymentRow,
    UserRecord, UserRow,
};

fn corrupt(column: &str, error: impl std::fmt::Display) -> String {
    format!("invalid stored {column}: {error}")
}

pub(super) fn row_to_user(row: UserRow) -> Result<User, String> {
    Ok(User {
        id: row.id,
        external_id: row.external_id,
        email: EmailAddress::new(&row.email).map_err(|err| corrupt("email", err))?,
        first_name: row.first_name,
        last_name: row.last_name,
        image_url: row.image_url,
        role: row.role.parse().map_err(|err| corrupt("role", err))?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(super) fn user_record(user: &User) -> UserRecord<'_> {
    UserRecord {
        id: user.id,
        external_id: &user.external_id,
        email: user.email.as_str(),
        first_name: user.first_name.as_deref(),
        last_name: user.last_name.as_deref(),
        image_url: user.image_url.as_deref(),
        role: user.role.as_str(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(super) fn row_to_course(row: CourseRow) -> Result<Course, String> {
    Ok(Course {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
        short_description: row.short_description,
        price_cents: row.price_cents,
        currency: Currency::new(&row.currency).map_err(|err| corrupt("currency", err))?,
        image_url: row.image_url,
        instructor_id: row.instructor_id,
        status: row.status.parse().map_err(|err| corrupt("course status", err))?,
        keywords: row.keywords,
        published_at: row.published_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(super) fn course_record(course: &Course) -> CourseRecord<'_> {
    CourseRecord {
        id: course.id,
        title: &course.title,
        slug: &course.slug,
        description: &course.description,
        short_description: course.short_description.as_deref(),
        price_cents: course.price_cents,
        currency: course.currency.as_str(),
        image_url: course.image_url.as_deref(),
        instructor_id: course.instructor_id,
        status: course.status.as_str(),
        keywords: &course.keywords,
        published_at: course.published_at,
        created_at: course.created_at,
        updated_at: course.updated_at,
    }
}

pub(super) fn row_to_lesson(row: LessonRow) -> Lesson {
    Lesson {
        id: row.id,
        course_id: row.course_id,
        title: row.title,
        content: row.content,
        video_url: row.video_url,
        duration_minutes: row.duration_minutes,
        position: row.position,
        is_preview: row.is_preview,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(super) fn lesson_record(lesson: &Lesson) -> LessonRecord<'_> {
    LessonRecord {
        id: lesson.id,
        course_id: lesson.course_id,
        title: &lesson.title,
        content: &lesson.content,
        video_url: lesson.video_url.as_deref(),
        duration_minutes: lesson.duration_minutes,
        position: lesson.position,
        is_preview: lesson.is_preview,
        created_at: lesson.created_at,
        updated_at: lesson.updated_at,
    }
}

pub(super) fn row_to_enrollment(row: EnrollmentRow) -> Result<Enrollment, String> {
    Ok(Enrollment::from_record(EnrollmentRecord {
        id: row.id,
        user_id: row.user_id,
        course_id: row.course_id,
        status: row.status.parse().map_err(|err| corrupt("enrollment status", err))?,
        progress: Progress::new(i64::from(row.progress))
            .map_err(|err| corrupt("progress", err))?,
        enrolled_at: row.enrolled_at,
        completed_at: row.completed_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn new_enrollment_row(enrollment: &Enrollment) -> NewEnrollmentRow<'static> {
    NewEnrollmentRow {
        id: enrollment.id(),
        user_id: enrollment.user_id(),
        course_id: enrollment.course_id(),
        status: enrollment.status().as_str(),
        progress: i16::from(enrollment.progress().value()),
        enrolled_at: enrollment.enrolled_at(),
        completed_at: enrollment.completed_at(),
        updated_at: enrollment.updated_at(),
    }
}

pub(super) fn enrollment_state(enrollment: &Enrollment) -> EnrollmentStateUpdate<'static> {
    EnrollmentStateUpdate {
        status: enrollment.status().as_str(),
        progress: i16::from(enrollment.progress().value()),
        completed_at: enrollment.completed_at(),
        updated_at: enrollment.updated_at(),
    }
}

pub(super) fn row_to_lesson_progress(row: LessonProgressRow) -> LessonProgress {
    LessonProgress {
        id: row.id,
        enrollment_id: row.enrollment_id,
        lesson_id: row.lesson_id,
        completed: row.completed,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(super) fn lesson_progress_row(marker: &LessonProgress) -> LessonProgressRow {
    LessonProgressRow {
        id: marker.id,
        enrollment_id: marker.enrollment_id,
        lesson_id: marker.lesson_id,
        completed: marker.completed,
        completed_at: marker.completed_at,
        created_at: marker.created_at,
        updated_at: marker.updated_at,
    }
}

pub(super) fn row_to_payment(row: PaymentRow) -> Result<Payment, String> {
    let refund_reason = row
        .refund_reason
        .map(|reason| reason.parse())
        .transpose()
        .map_err(|err| corrupt("refund reason", err))?;
    Ok(Payment {
        id: row.id,
        enrollment_id: row.enrollment_id,
        user_id: row.user_id,
        course_id: row.course_id,
        amount_cents: row.amount_cents,
        currency: Currency::new(&row.currency).map_err(|err| corrupt("currency", err))?,
        status: row.status.parse().map_err(|err| corrupt("payment status", err))?,
        checkout_session_id: row.checkout_session_id,
        payment_intent_id: row.payment_intent_id,
        receipt_url: row.receipt_url,
        failure_reason: row.failure_reason,
        refund_id: row.refund_id,
        refunded_amount_cents: row.refunded_amount_cents,
        refund_reason,
        paid_at: row.paid_at,
        refunded_at: row.refunded_at,
        refund_claimed_at: row.refund_claimed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(super) fn payment_record(payment: &Payment) -> PaymentRecord<'_> {
    PaymentRecord {
        id: payment.id,
        enrollment_id: payment.enrollment_id,
        user_id: payment.user_id,
        course_id: payment.course_id,
        amount_cents: payment.amount_cents,
        currency: payment.currency.as_str(),
        status: payment.status.as_str(),
        checkout_session_id: payment.checkout_session_id.as_deref(),
        payment_intent_id: payment.payment_intent_id.as_deref(),
        receipt_url: payment.receipt_url.as_deref(),
        failure_reason: payment.failure_reason.as_deref(),
        refund_id: payment.refund_id.as_deref(),
        refunded_amount_cents: payment.refunded_amount_cents,
        refund_reason: payment.refund_reason.map(|reason| reason.as_str()),
        paid_at: payment.paid_at,
        refunded_at: payment.refunded_at,
        refund_claimed_at: payment.refund_claimed_at,
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

pub(super) fn row_to_certificate(row: CertificateRow) -> Certificate {
    Certificate {
        id: row.id,
        enrollment_id: row.enrollment_id,
        user_id: row.user_id,
        course_id: row.course_id,
        certificate_number: CertificateNumber::from_stored(row.certificate_number),
        issued_at: row.issued_at,
        pdf_url: row.pdf_url,
    }
}

pub(super) fn certificate_row(certificate: &Certificate) -> CertificateRow {
    CertificateRow {
        id: certificate.id,
        enrollment_id: certificate.enrollment_id,
        user_id: certificate.user_id,
        course_id: certificate.course_id,
        certificate_number: certificate.certificate_number.as_str().to_owned(),
        issued_at: certificate.issued_at,
        pdf_url: certificate.pdf_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{EnrollmentStatus, UserRole};

    fn enrollment_row(status: &str, progress: i16) -> EnrollmentRow {
        let now = Utc::now();
        EnrollmentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            status: status.to_owned(),
            progress,
            enrolled_at: now,
            completed_at: None,
            updated_at: now,
        }
    }

    #[rstest]
    fn completed_row_without_stamp_gains_one() {
        let row = enrollment_row("COMPLETED", 100);
        let updated_at = row.updated_at;

        let enrollment = row_to_enrollment(row).expect("valid row");

        assert_eq!(enrollment.status(), EnrollmentStatus::Completed);
        assert_eq!(enrollment.completed_at(), Some(updated_at));
    }

    #[rstest]
    #[case("ENROLLED", 0, "enrollment status")]
    #[case("ACTIVE", 101, "progress")]
    fn corrupt_enrollment_row_is_reported(
        #[case] status: &str,
        #[case] progress: i16,
        #[case] column: &str,
    ) {
        let error = row_to_enrollment(enrollment_row(status, progress)).expect_err("corrupt");

        assert!(error.starts_with(&format!("invalid stored {column}")), "{error}");
    }

    #[rstest]
    fn user_round_trips_role_and_email() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            external_id: "idp_1".to_owned(),
            email: "ada@example.test".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: None,
            image_url: None,
            role: "INSTRUCTOR".to_owned(),
            created_at: now,
            updated_at: now,
        };

        let user = row_to_user(row).expect("valid row");
        let record = user_record(&user);

        assert_eq!(user.role, UserRole::Instructor);
        assert_eq!(record.role, "INSTRUCTOR");
        assert_eq!(record.email, "ada@example.test");
        assert_eq!(record.last_name, None);
    }
}

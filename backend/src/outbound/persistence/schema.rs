//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Accounts mirrored from the identity provider.
    users (id) {
        id -> Uuid,
        /// Identity-provider subject; unique.
        external_id -> Varchar,
        /// Lower-cased address; unique.
        email -> Varchar,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        image_url -> Nullable<Varchar>,
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    courses (id) {
        id -> Uuid,
        title -> Varchar,
        slug -> Varchar,
        description -> Text,
        short_description -> Nullable<Text>,
        price_cents -> Int8,
        currency -> Varchar,
        image_url -> Nullable<Varchar>,
        instructor_id -> Uuid,
        status -> Varchar,
        keywords -> Array<Text>,
        published_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lessons (id) {
        id -> Uuid,
        course_id -> Uuid,
        title -> Varchar,
        content -> Text,
        video_url -> Nullable<Varchar>,
        duration_minutes -> Nullable<Int4>,
        position -> Int4,
        is_preview -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, course) pair.
    enrollments (id) {
        id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        status -> Varchar,
        /// Percentage in 0..=100.
        progress -> Int2,
        enrolled_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Completion markers; `lesson_id` carries no foreign key.
    lesson_progress (id) {
        id -> Uuid,
        enrollment_id -> Uuid,
        lesson_id -> Uuid,
        completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        enrollment_id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        amount_cents -> Int8,
        currency -> Varchar,
        status -> Varchar,
        checkout_session_id -> Nullable<Varchar>,
        payment_intent_id -> Nullable<Varchar>,
        receipt_url -> Nullable<Varchar>,
        failure_reason -> Nullable<Text>,
        refund_id -> Nullable<Varchar>,
        refunded_amount_cents -> Nullable<Int8>,
        refund_reason -> Nullable<Varchar>,
        paid_at -> Nullable<Timestamptz>,
        refunded_at -> Nullable<Timestamptz>,
        refund_claimed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    certificates (id) {
        id -> Uuid,
        enrollment_id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        certificate_number -> Varchar,
        issued_at -> Timestamptz,
        pdf_url -> Varchar,
    }
}

diesel::table! {
    /// Per-month certificate counters keyed by `YYYYMM`.
    certificate_sequences (period) {
        period -> Varchar,
        last_value -> Int4,
    }
}

diesel::joinable!(courses -> users (instructor_id));
diesel::joinable!(lessons -> courses (course_id));
diesel::joinable!(enrollments -> courses (course_id));
diesel::joinable!(lesson_progress -> enrollments (enrollment_id));
diesel::joinable!(payments -> enrollments (enrollment_id));
diesel::joinable!(certificates -> enrollments (enrollment_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    courses,
    lessons,
    enrollments,
    lesson_progress,
    payments,
    certificates,
    certificate_sequences,
);

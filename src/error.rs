use uuid::Uuid;

/// Caller-visible failures of the academic record pipeline.
///
/// A student that exists but has no marks or attendance yet is not an
/// error; those views carry an empty state instead.
#[derive(Debug, thiserror::Error)]
pub enum AcademicError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("malformed record for student {student} (subject {}): {reason}", subject_label(.subject))]
    MalformedInput {
        student: String,
        subject: Option<Uuid>,
        reason: String,
    },
}

fn subject_label(subject: &Option<Uuid>) -> String {
    subject
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unlinked".to_string())
}

impl AcademicError {
    pub fn student_not_found(reg_no: &str) -> Self {
        Self::NotFound {
            entity: "student",
            key: reg_no.to_string(),
        }
    }

    pub fn malformed(student: &str, subject: Option<Uuid>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            student: student.to_string(),
            subject,
            reason: reason.into(),
        }
    }
}

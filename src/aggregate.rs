//! Turns raw mark and attendance rows into normalized per-subject entries
//! and attendance summaries.

use crate::error::AcademicError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, RawMarkRow, StudentAttendance,
    SubjectChart, SubjectMarkEntry, SubjectRef, CIE_MAX,
};

const CHART_NAME_LIMIT: usize = 15;

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

pub fn compute_attendance_summary(records: &[AttendanceRecord]) -> AttendanceSummary {
    let total = records.len();
    let present = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Present)
        .count();

    AttendanceSummary {
        total,
        present,
        absent: total - present,
        percentage: percentage(present, total),
    }
}

/// Filters a student's attendance by subject code, newest date first.
/// An unknown subject code simply matches nothing.
pub fn student_attendance(
    mut records: Vec<AttendanceRecord>,
    subject_code: Option<&str>,
) -> StudentAttendance {
    if let Some(code) = subject_code {
        records.retain(|record| record.subject.code.eq_ignore_ascii_case(code));
    }
    records.sort_by(|a, b| b.date.cmp(&a.date));
    let stats = compute_attendance_summary(&records);
    StudentAttendance { records, stats }
}

fn normalize_score(
    student: &str,
    subject: Option<uuid::Uuid>,
    label: &str,
    value: Option<f64>,
    max: f64,
) -> Result<f64, AcademicError> {
    let value = value.unwrap_or(0.0);
    if !(0.0..=max).contains(&value) {
        return Err(AcademicError::malformed(
            student,
            subject,
            format!("{label} {value} outside 0..={max}"),
        ));
    }
    Ok(value)
}

/// Normalizes one raw mark row. `attendance_fallback` is used only when the
/// row carries no attendance percentage of its own.
pub fn normalize_mark_row(
    student: &str,
    row: &RawMarkRow,
    attendance_fallback: f64,
) -> Result<SubjectMarkEntry, AcademicError> {
    let (Some(id), Some(code)) = (row.subject_id, row.subject_code.as_deref()) else {
        return Err(AcademicError::malformed(
            student,
            row.subject_id,
            "mark row is not linked to a subject",
        ));
    };
    let code = code.trim();
    if code.is_empty() {
        return Err(AcademicError::malformed(student, Some(id), "subject code is blank"));
    }
    let name = row
        .subject_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(code);

    let cie1_score = normalize_score(student, Some(id), "cie1 score", row.cie1_score, CIE_MAX)?;
    let cie2_score = normalize_score(student, Some(id), "cie2 score", row.cie2_score, CIE_MAX)?;
    let attendance_percentage = normalize_score(
        student,
        Some(id),
        "attendance percentage",
        Some(row.attendance_percentage.unwrap_or(attendance_fallback)),
        100.0,
    )?;

    Ok(SubjectMarkEntry {
        subject: SubjectRef {
            id,
            code: code.to_string(),
            name: name.to_string(),
        },
        cie1_score,
        cie2_score,
        total_score: cie1_score + cie2_score,
        attendance_percentage,
    })
}

/// Builds the subject-ordered mark entries of one student. Attendance
/// records fill in the percentage of rows that do not carry one.
pub fn aggregate_marks(
    student: &str,
    rows: &[RawMarkRow],
    attendance: &[AttendanceRecord],
) -> Result<Vec<SubjectMarkEntry>, AcademicError> {
    let mut entries = rows
        .iter()
        .map(|row| {
            let fallback = match row.subject_id {
                Some(id) if row.attendance_percentage.is_none() => {
                    let for_subject: Vec<AttendanceRecord> = attendance
                        .iter()
                        .filter(|record| record.subject.id == id)
                        .cloned()
                        .collect();
                    compute_attendance_summary(&for_subject).percentage
                }
                _ => 0.0,
            };
            normalize_mark_row(student, row, fallback)
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| a.subject.code.cmp(&b.subject.code));
    Ok(entries)
}

fn short_name(name: &str) -> String {
    if name.chars().count() > CHART_NAME_LIMIT {
        let head: String = name.chars().take(CHART_NAME_LIMIT).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

pub fn subject_chart(entries: &[SubjectMarkEntry], attendance_threshold: f64) -> SubjectChart {
    SubjectChart {
        labels: entries.iter().map(|e| e.subject.code.clone()).collect(),
        short_names: entries.iter().map(|e| short_name(&e.subject.name)).collect(),
        cie1: entries.iter().map(|e| e.cie1_score).collect(),
        cie2: entries.iter().map(|e| e.cie2_score).collect(),
        attendance: entries.iter().map(|e| e.attendance_percentage).collect(),
        low_attendance: entries
            .iter()
            .map(|e| e.attendance_percentage < attendance_threshold)
            .collect(),
    }
}

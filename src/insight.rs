use crate::config::Thresholds;
use crate::models::{AttendanceSignal, StudentInsight, SubjectMarkEntry, SubjectScore};

/// Derives the qualitative signals of one student from their mark entries.
///
/// Returns `None` for an empty entry list: a student without marks has no
/// insight, which callers show as a distinct empty state.
pub fn classify_student(
    entries: &[SubjectMarkEntry],
    thresholds: &Thresholds,
) -> Option<StudentInsight> {
    let strongest = first_by(entries, |candidate, best| candidate > best)?;
    let weakest = first_by(entries, |candidate, best| candidate < best)?;

    let focus_area = (weakest.total_score < thresholds.focus_threshold)
        .then(|| SubjectScore::from(weakest));

    let attendance = entries
        .iter()
        .find(|entry| entry.attendance_percentage < thresholds.attendance_threshold)
        .map(|entry| AttendanceSignal::Alert {
            subject: entry.subject.clone(),
            percentage: entry.attendance_percentage,
        })
        .unwrap_or(AttendanceSignal::GoodStanding);

    let failing_subjects: Vec<SubjectScore> = entries
        .iter()
        .filter(|entry| entry.total_score < thresholds.pass_threshold)
        .map(SubjectScore::from)
        .collect();

    let is_at_risk = focus_area.is_some()
        || matches!(attendance, AttendanceSignal::Alert { .. })
        || !failing_subjects.is_empty();

    Some(StudentInsight {
        strongest_subject: SubjectScore::from(strongest),
        focus_area,
        attendance,
        failing_subjects,
        is_at_risk,
    })
}

/// First entry that no later entry beats; ties keep the earlier one.
fn first_by(
    entries: &[SubjectMarkEntry],
    beats: impl Fn(f64, f64) -> bool,
) -> Option<&SubjectMarkEntry> {
    entries.iter().fold(None, |best, entry| match best {
        Some(current) if !beats(entry.total_score, current.total_score) => Some(current),
        _ => Some(entry),
    })
}

/// A student passes when they have marks and every subject total reaches
/// the pass threshold.
pub fn passes_all(entries: &[SubjectMarkEntry], thresholds: &Thresholds) -> bool {
    !entries.is_empty()
        && entries
            .iter()
            .all(|entry| entry.total_score >= thresholds.pass_threshold)
}

pub fn is_at_risk(entries: &[SubjectMarkEntry], thresholds: &Thresholds) -> bool {
    classify_student(entries, thresholds).is_some_and(|insight| insight.is_at_risk)
}

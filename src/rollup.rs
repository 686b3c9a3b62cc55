//! Department and institute statistics. Both scopes go through
//! [`compute_department_stats`] so pass and risk rules never diverge.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::aggregate::{percentage, round2};
use crate::config::Thresholds;
use crate::insight::{classify_student, is_at_risk, passes_all};
use crate::models::{AtRiskStudent, DepartmentStats, StudentRecord, Subject, SubjectMarkEntry};

/// Instructors count towards a department only through the subjects they
/// teach there.
pub fn faculty_count(subjects: &[Subject]) -> usize {
    subjects
        .iter()
        .filter_map(|subject| subject.instructor_id)
        .collect::<HashSet<Uuid>>()
        .len()
}

pub fn compute_department_stats(
    students: &[StudentRecord],
    marks_by_student: &HashMap<Uuid, Vec<SubjectMarkEntry>>,
    subjects: &[Subject],
    thresholds: &Thresholds,
) -> DepartmentStats {
    let mut seen = HashSet::new();
    let mut passing = 0usize;
    let mut at_risk = 0usize;
    let mut percent_sum = 0.0;
    let mut entry_count = 0usize;

    for student in students {
        if !seen.insert(student.id) {
            continue;
        }
        let entries = marks_by_student
            .get(&student.id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if passes_all(entries, thresholds) {
            passing += 1;
        }
        if is_at_risk(entries, thresholds) {
            at_risk += 1;
        }
        percent_sum += entries.iter().map(SubjectMarkEntry::total_percent).sum::<f64>();
        entry_count += entries.len();
    }

    let student_count = seen.len();
    if student_count == 0 {
        return DepartmentStats::default();
    }
    DepartmentStats {
        student_count,
        faculty_count: faculty_count(subjects),
        pass_percentage: percentage(passing, student_count),
        at_risk_count: at_risk,
        average_percentage: if entry_count == 0 {
            0.0
        } else {
            round2(percent_sum / entry_count as f64)
        },
    }
}

/// At-risk students of the given scope with the reasons behind each flag,
/// ordered by registration number.
pub fn at_risk_students(
    students: &[StudentRecord],
    marks_by_student: &HashMap<Uuid, Vec<SubjectMarkEntry>>,
    thresholds: &Thresholds,
) -> Vec<AtRiskStudent> {
    let mut flagged: Vec<AtRiskStudent> = students
        .iter()
        .filter_map(|student| {
            let entries = marks_by_student.get(&student.id)?;
            let insight = classify_student(entries, thresholds)?;
            insight.is_at_risk.then(|| AtRiskStudent {
                reg_no: student.reg_no.clone(),
                name: student.name.clone(),
                department: student.department.clone(),
                reasons: insight.risk_reasons(),
            })
        })
        .collect();

    flagged.sort_by(|a, b| a.reg_no.cmp(&b.reg_no));
    flagged.dedup_by(|a, b| a.reg_no == b.reg_no);
    flagged
}

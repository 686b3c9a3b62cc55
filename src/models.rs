use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum score of a single CIE component.
pub const CIE_MAX: f64 = 50.0;
/// Maximum total score of a subject (two CIE components).
pub const TOTAL_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: Uuid,
    pub reg_no: String,
    pub name: String,
    pub department: String,
    pub semester: i32,
    pub section: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub department: String,
    pub semester: i32,
    pub instructor_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// A CIE mark row exactly as the record store hands it over. Any field may
/// be absent; the aggregator turns it into a [`SubjectMarkEntry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMarkRow {
    pub subject_id: Option<Uuid>,
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub cie1_score: Option<f64>,
    pub cie2_score: Option<f64>,
    pub attendance_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarkEntry {
    pub subject: SubjectRef,
    pub cie1_score: f64,
    pub cie2_score: f64,
    pub total_score: f64,
    pub attendance_percentage: f64,
}

impl SubjectMarkEntry {
    /// Total score expressed as a percentage of [`TOTAL_MAX`].
    pub fn total_percent(&self) -> f64 {
        self.total_score / TOTAL_MAX * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PRESENT" | "P" => Ok(Self::Present),
            "ABSENT" | "A" => Ok(Self::Absent),
            other => Err(format!("unknown attendance status {other:?}")),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: Uuid,
    pub subject: SubjectRef,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendance {
    pub records: Vec<AttendanceRecord>,
    pub stats: AttendanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub subject: SubjectRef,
    pub total_score: f64,
}

impl From<&SubjectMarkEntry> for SubjectScore {
    fn from(entry: &SubjectMarkEntry) -> Self {
        Self {
            subject: entry.subject.clone(),
            total_score: entry.total_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttendanceSignal {
    Alert { subject: SubjectRef, percentage: f64 },
    GoodStanding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInsight {
    pub strongest_subject: SubjectScore,
    pub focus_area: Option<SubjectScore>,
    pub attendance: AttendanceSignal,
    pub failing_subjects: Vec<SubjectScore>,
    pub is_at_risk: bool,
}

impl StudentInsight {
    pub fn attendance_alert(&self) -> Option<(&SubjectRef, f64)> {
        match &self.attendance {
            AttendanceSignal::Alert {
                subject,
                percentage,
            } => Some((subject, *percentage)),
            AttendanceSignal::GoodStanding => None,
        }
    }

    /// Human readable reasons behind the at-risk flag, empty when not at risk.
    pub fn risk_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if let Some(focus) = &self.focus_area {
            reasons.push(format!(
                "low score in {} ({}/{})",
                focus.subject.name, focus.total_score, TOTAL_MAX
            ));
        }
        if let Some((subject, percentage)) = self.attendance_alert() {
            reasons.push(format!("attendance {percentage}% in {}", subject.name));
        }
        for failing in &self.failing_subjects {
            let already_listed = self
                .focus_area
                .as_ref()
                .is_some_and(|focus| focus.subject == failing.subject);
            if !already_listed {
                reasons.push(format!(
                    "below pass mark in {} ({}/{})",
                    failing.subject.name, failing.total_score, TOTAL_MAX
                ));
            }
        }
        reasons
    }
}

/// Chart-ready per-subject series for the student analytics panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectChart {
    pub labels: Vec<String>,
    pub short_names: Vec<String>,
    pub cie1: Vec<f64>,
    pub cie2: Vec<f64>,
    pub attendance: Vec<f64>,
    pub low_attendance: Vec<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub student_count: usize,
    pub faculty_count: usize,
    pub pass_percentage: f64,
    pub at_risk_count: usize,
    pub average_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCard {
    pub code: String,
    pub name: String,
    pub stats: DepartmentStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskStudent {
    pub reg_no: String,
    pub name: String,
    pub department: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstituteSummary {
    pub overall: DepartmentStats,
    pub departments: Vec<DepartmentCard>,
    pub low_performers: Vec<AtRiskStudent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Faculty,
    Hod,
    Principal,
    Student,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "FACULTY" => Ok(Self::Faculty),
            "HOD" => Ok(Self::Hod),
            "PRINCIPAL" => Ok(Self::Principal),
            "STUDENT" => Ok(Self::Student),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyDetail {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub subjects: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub kind: String,
    pub department: String,
    pub semester: i32,
    pub subject: Option<SubjectRef>,
    pub uploader: Option<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub subject_code: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Applies every supplied field, keeping the current value otherwise.
    pub fn apply(&self, student: &StudentRecord) -> StudentRecord {
        let pick = |update: &Option<String>, current: &Option<String>| {
            update
                .as_ref()
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .or_else(|| current.clone())
        };
        StudentRecord {
            email: pick(&self.email, &student.email),
            phone: pick(&self.phone, &student.phone),
            parent_phone: pick(&self.parent_phone, &student.parent_phone),
            address: pick(&self.address, &student.address),
            ..student.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListing {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub mark_count: usize,
}

pub fn department_display_name(code: &str) -> String {
    match code {
        "CS" => "Computer Science".to_string(),
        "ME" => "Mechanical".to_string(),
        "EC" => "Electronics".to_string(),
        "CV" => "Civil".to_string(),
        other => other.to_string(),
    }
}

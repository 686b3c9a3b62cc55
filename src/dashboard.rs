//! Role views assembled from record store fetches and the pure pipeline.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate;
use crate::config::Thresholds;
use crate::error::AcademicError;
use crate::insight::classify_student;
use crate::models::{
    department_display_name, AttendanceRecord, DepartmentCard, FacultyDetail, InstituteSummary,
    ProfileUpdate, RawMarkRow, Resource, ResourceFilter, Role, StudentAttendance, StudentInsight,
    StudentListing, StudentRecord, Subject, SubjectChart, SubjectMarkEntry, UserRecord,
};
use crate::rollup::{at_risk_students, compute_department_stats};
use crate::store::RecordStore;

const UNKNOWN_FACULTY: &str = "Unknown Faculty";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub student: StudentRecord,
    pub entries: Vec<SubjectMarkEntry>,
    pub insight: Option<StudentInsight>,
    pub chart: Option<SubjectChart>,
}

async fn require_student<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
) -> anyhow::Result<StudentRecord> {
    let student = store.student(reg_no).await?;
    Ok(student.ok_or_else(|| AcademicError::student_not_found(reg_no))?)
}

pub async fn student_dashboard<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
    thresholds: &Thresholds,
) -> anyhow::Result<StudentDashboard> {
    let student = require_student(store, reg_no).await?;
    let (rows, attendance) = tokio::try_join!(
        store.mark_rows(student.id),
        store.attendance(student.id, None)
    )?;

    let entries = aggregate::aggregate_marks(&student.reg_no, &rows, &attendance)?;
    let insight = classify_student(&entries, thresholds);
    let chart = (!entries.is_empty())
        .then(|| aggregate::subject_chart(&entries, thresholds.attendance_threshold));

    debug!(
        reg_no,
        subjects = entries.len(),
        at_risk = insight.as_ref().is_some_and(|i| i.is_at_risk),
        "student dashboard assembled"
    );
    Ok(StudentDashboard {
        student,
        entries,
        insight,
        chart,
    })
}

pub async fn student_attendance<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
    subject_code: Option<&str>,
) -> anyhow::Result<StudentAttendance> {
    let student = require_student(store, reg_no).await?;
    let records = store.attendance(student.id, subject_code).await?;
    Ok(aggregate::student_attendance(records, subject_code))
}

/// Instructors of the subjects in the student's department and semester,
/// each with the names of the subjects they teach.
pub fn faculty_details(subjects: &[Subject], users: &[UserRecord]) -> Vec<FacultyDetail> {
    users
        .iter()
        .filter(|user| user.role == Role::Faculty)
        .filter_map(|user| {
            let teaches: Vec<&str> = subjects
                .iter()
                .filter(|subject| subject.instructor_id == Some(user.id))
                .map(|subject| subject.name.as_str())
                .collect();
            if teaches.is_empty() {
                return None;
            }
            Some(FacultyDetail {
                id: user.id,
                name: user
                    .full_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_FACULTY.to_string()),
                email: user.email.clone(),
                department: user.department.clone(),
                subjects: teaches.join(", "),
            })
        })
        .collect()
}

pub async fn student_faculty<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
) -> anyhow::Result<Vec<FacultyDetail>> {
    let student = require_student(store, reg_no).await?;
    let subjects = store
        .subjects(Some(student.department.as_str()), Some(student.semester))
        .await?;

    let instructor_ids: Vec<Uuid> = subjects
        .iter()
        .filter_map(|subject| subject.instructor_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if instructor_ids.is_empty() {
        return Ok(Vec::new());
    }

    let users = store.users_by_ids(&instructor_ids).await?;
    Ok(faculty_details(&subjects, &users))
}

pub async fn student_resources<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
    filter: &ResourceFilter,
) -> anyhow::Result<Vec<Resource>> {
    let student = require_student(store, reg_no).await?;
    let mut resources = store.resources(&student, filter).await?;
    resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(resources)
}

pub async fn update_profile<S: RecordStore + ?Sized>(
    store: &S,
    reg_no: &str,
    update: &ProfileUpdate,
) -> anyhow::Result<StudentRecord> {
    let student = require_student(store, reg_no).await?;
    store.update_profile(&student, update).await
}

pub async fn list_students<S: RecordStore + ?Sized>(
    store: &S,
    department: Option<&str>,
) -> anyhow::Result<Vec<StudentListing>> {
    let (students, rows) = tokio::try_join!(
        store.students(department),
        store.scope_mark_rows(department)
    )?;

    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for (student_id, _) in &rows {
        *counts.entry(*student_id).or_default() += 1;
    }

    let mut listings: Vec<StudentListing> = students
        .into_iter()
        .map(|student| StudentListing {
            mark_count: counts.get(&student.id).copied().unwrap_or(0),
            student,
        })
        .collect();
    listings.sort_by(|a, b| a.student.reg_no.cmp(&b.student.reg_no));
    Ok(listings)
}

/// Normalizes the mark rows of every student in scope. A malformed row
/// fails the whole rollup rather than silently shrinking it.
fn marks_by_student(
    students: &[StudentRecord],
    rows: Vec<(Uuid, RawMarkRow)>,
    attendance: &[AttendanceRecord],
) -> anyhow::Result<HashMap<Uuid, Vec<SubjectMarkEntry>>> {
    let mut raw: HashMap<Uuid, Vec<RawMarkRow>> = HashMap::new();
    for (student_id, row) in rows {
        raw.entry(student_id).or_default().push(row);
    }
    let mut attendance_by_student: HashMap<Uuid, Vec<AttendanceRecord>> = HashMap::new();
    for record in attendance {
        attendance_by_student
            .entry(record.student_id)
            .or_default()
            .push(record.clone());
    }

    let mut marks = HashMap::new();
    for student in students {
        let Some(rows) = raw.get(&student.id) else {
            continue;
        };
        let records = attendance_by_student
            .get(&student.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let entries = aggregate::aggregate_marks(&student.reg_no, rows, records)?;
        marks.insert(student.id, entries);
    }
    Ok(marks)
}

pub async fn department_card<S: RecordStore + ?Sized>(
    store: &S,
    code: &str,
    semester: Option<i32>,
    thresholds: &Thresholds,
) -> anyhow::Result<DepartmentCard> {
    let (mut students, rows, attendance, subjects) = tokio::try_join!(
        store.students(Some(code)),
        store.scope_mark_rows(Some(code)),
        store.scope_attendance(Some(code)),
        store.subjects(Some(code), semester)
    )?;
    if let Some(semester) = semester {
        students.retain(|student| student.semester == semester);
    }

    let marks = marks_by_student(&students, rows, &attendance)?;
    let stats = compute_department_stats(&students, &marks, &subjects, thresholds);
    info!(
        department = code,
        students = stats.student_count,
        at_risk = stats.at_risk_count,
        "department stats computed"
    );
    Ok(DepartmentCard {
        code: code.to_string(),
        name: department_display_name(code),
        stats,
    })
}

/// Department cards, the institute-wide rollup and the at-risk list for the
/// principal view. One fetch of the whole institute feeds every figure.
pub async fn institute_summary<S: RecordStore + ?Sized>(
    store: &S,
    thresholds: &Thresholds,
) -> anyhow::Result<InstituteSummary> {
    let (students, rows, attendance, subjects) = tokio::try_join!(
        store.students(None),
        store.scope_mark_rows(None),
        store.scope_attendance(None),
        store.subjects(None, None)
    )?;
    let marks = marks_by_student(&students, rows, &attendance)?;

    let codes: BTreeSet<&str> = students
        .iter()
        .map(|student| student.department.as_str())
        .chain(subjects.iter().map(|subject| subject.department.as_str()))
        .collect();

    let departments = codes
        .into_iter()
        .map(|code| {
            let scoped_students: Vec<StudentRecord> = students
                .iter()
                .filter(|student| student.department == code)
                .cloned()
                .collect();
            let scoped_subjects: Vec<Subject> = subjects
                .iter()
                .filter(|subject| subject.department == code)
                .cloned()
                .collect();
            DepartmentCard {
                code: code.to_string(),
                name: department_display_name(code),
                stats: compute_department_stats(
                    &scoped_students,
                    &marks,
                    &scoped_subjects,
                    thresholds,
                ),
            }
        })
        .collect();

    Ok(InstituteSummary {
        overall: compute_department_stats(&students, &marks, &subjects, thresholds),
        departments,
        low_performers: at_risk_students(&students, &marks, thresholds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, DepartmentStats, SubjectRef};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        students: Mutex<Vec<StudentRecord>>,
        subjects: Vec<Subject>,
        users: Vec<UserRecord>,
        marks: Vec<(Uuid, RawMarkRow)>,
        attendance: Vec<AttendanceRecord>,
        resources: Vec<Resource>,
    }

    fn in_scope(student: &StudentRecord, department: Option<&str>) -> bool {
        department.map_or(true, |code| student.department == code)
    }

    impl MemoryStore {
        fn department_of(&self, student_id: Uuid) -> Option<String> {
            self.students
                .lock()
                .unwrap()
                .iter()
                .find(|student| student.id == student_id)
                .map(|student| student.department.clone())
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn student(&self, reg_no: &str) -> anyhow::Result<Option<StudentRecord>> {
            Ok(self
                .students
                .lock()
                .unwrap()
                .iter()
                .find(|student| student.reg_no == reg_no)
                .cloned())
        }

        async fn mark_rows(&self, student_id: Uuid) -> anyhow::Result<Vec<RawMarkRow>> {
            Ok(self
                .marks
                .iter()
                .filter(|(id, _)| *id == student_id)
                .map(|(_, row)| row.clone())
                .collect())
        }

        async fn attendance(
            &self,
            student_id: Uuid,
            subject_code: Option<&str>,
        ) -> anyhow::Result<Vec<AttendanceRecord>> {
            Ok(self
                .attendance
                .iter()
                .filter(|record| record.student_id == student_id)
                .filter(|record| {
                    subject_code.map_or(true, |code| record.subject.code.eq_ignore_ascii_case(code))
                })
                .cloned()
                .collect())
        }

        async fn students(&self, department: Option<&str>) -> anyhow::Result<Vec<StudentRecord>> {
            Ok(self
                .students
                .lock()
                .unwrap()
                .iter()
                .filter(|student| in_scope(student, department))
                .cloned()
                .collect())
        }

        async fn scope_mark_rows(
            &self,
            department: Option<&str>,
        ) -> anyhow::Result<Vec<(Uuid, RawMarkRow)>> {
            Ok(self
                .marks
                .iter()
                .filter(|(id, _)| {
                    department.is_none() || self.department_of(*id).as_deref() == department
                })
                .cloned()
                .collect())
        }

        async fn scope_attendance(
            &self,
            department: Option<&str>,
        ) -> anyhow::Result<Vec<AttendanceRecord>> {
            Ok(self
                .attendance
                .iter()
                .filter(|record| {
                    department.is_none()
                        || self.department_of(record.student_id).as_deref() == department
                })
                .cloned()
                .collect())
        }

        async fn subjects(
            &self,
            department: Option<&str>,
            semester: Option<i32>,
        ) -> anyhow::Result<Vec<Subject>> {
            Ok(self
                .subjects
                .iter()
                .filter(|subject| department.map_or(true, |code| subject.department == code))
                .filter(|subject| semester.map_or(true, |sem| subject.semester == sem))
                .cloned()
                .collect())
        }

        async fn users_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>> {
            Ok(self
                .users
                .iter()
                .filter(|user| ids.contains(&user.id))
                .cloned()
                .collect())
        }

        async fn resources(
            &self,
            student: &StudentRecord,
            filter: &ResourceFilter,
        ) -> anyhow::Result<Vec<Resource>> {
            Ok(self
                .resources
                .iter()
                .filter(|resource| match filter.subject_code.as_deref() {
                    Some(code) => resource.subject.as_ref().is_some_and(|s| s.code == code),
                    None => {
                        resource.department == student.department
                            && resource.semester == student.semester
                    }
                })
                .filter(|resource| filter.kind.as_deref().map_or(true, |kind| resource.kind == kind))
                .cloned()
                .collect())
        }

        async fn update_profile(
            &self,
            student: &StudentRecord,
            update: &ProfileUpdate,
        ) -> anyhow::Result<StudentRecord> {
            let next = update.apply(student);
            let mut students = self.students.lock().unwrap();
            if let Some(slot) = students.iter_mut().find(|s| s.id == student.id) {
                *slot = next.clone();
            }
            Ok(next)
        }
    }

    fn student(reg_no: &str, department: &str) -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            reg_no: reg_no.to_string(),
            name: format!("Student {reg_no}"),
            department: department.to_string(),
            semester: 3,
            section: "A".to_string(),
            email: Some(format!("{reg_no}@sgp.edu.in")),
            phone: None,
            parent_phone: None,
            address: None,
        }
    }

    fn subject(code: &str, name: &str, department: &str, instructor: Option<Uuid>) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            semester: 3,
            instructor_id: instructor,
        }
    }

    fn reference(subject: &Subject) -> SubjectRef {
        SubjectRef {
            id: subject.id,
            code: subject.code.clone(),
            name: subject.name.clone(),
        }
    }

    fn mark(subject: &Subject, cie1: f64, cie2: f64, attendance: Option<f64>) -> RawMarkRow {
        RawMarkRow {
            subject_id: Some(subject.id),
            subject_code: Some(subject.code.clone()),
            subject_name: Some(subject.name.clone()),
            cie1_score: Some(cie1),
            cie2_score: Some(cie2),
            attendance_percentage: attendance,
        }
    }

    fn attend(student: &StudentRecord, subject: &Subject, day: u32, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            student_id: student.id,
            subject: reference(subject),
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            status: if present {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
        }
    }

    fn faculty(name: Option<&str>, role: Role) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: name.unwrap_or("anon").to_lowercase(),
            full_name: name.map(str::to_string),
            email: None,
            department: Some("CS".to_string()),
            role,
        }
    }

    struct Fixture {
        store: MemoryStore,
        math: Subject,
    }

    fn fixture() -> Fixture {
        let meera = faculty(Some("Meera Nair"), Role::Faculty);
        let nameless = faculty(None, Role::Faculty);
        let math = subject("MA301", "Math", "CS", Some(meera.id));
        let phys = subject("PH301", "Phys", "CS", Some(meera.id));
        let networks = subject("CS303", "Networks", "CS", Some(nameless.id));
        let thermo = subject("ME301", "Thermodynamics", "ME", None);

        let asha = student("CS001", "CS");
        let vikram = student("CS002", "CS");
        let rahul = student("ME001", "ME");
        let fresh = student("CS003", "CS");

        let marks = vec![
            (asha.id, mark(&math, 20.0, 15.0, Some(70.0))),
            (asha.id, mark(&phys, 25.0, 20.0, Some(90.0))),
            (vikram.id, mark(&math, 40.0, 40.0, None)),
            (vikram.id, mark(&phys, 38.0, 39.0, Some(95.0))),
            (rahul.id, mark(&thermo, 10.0, 12.0, Some(80.0))),
        ];
        let attendance = vec![
            attend(&asha, &math, 1, true),
            attend(&asha, &math, 3, false),
            attend(&asha, &phys, 2, true),
            attend(&vikram, &math, 1, true),
            attend(&vikram, &math, 2, true),
            attend(&vikram, &math, 3, true),
            attend(&vikram, &math, 4, false),
        ];
        let resources = vec![
            Resource {
                id: Uuid::new_v4(),
                title: "Old notes".to_string(),
                kind: "NOTES".to_string(),
                department: "CS".to_string(),
                semester: 3,
                subject: Some(reference(&math)),
                uploader: Some("meera nair".to_string()),
                url: "https://lms/old".to_string(),
                created_at: Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap(),
            },
            Resource {
                id: Uuid::new_v4(),
                title: "New assignment".to_string(),
                kind: "ASSIGNMENT".to_string(),
                department: "CS".to_string(),
                semester: 3,
                subject: Some(reference(&phys)),
                uploader: None,
                url: "https://lms/new".to_string(),
                created_at: Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap(),
            },
        ];

        Fixture {
            store: MemoryStore {
                students: Mutex::new(vec![asha, vikram, rahul, fresh]),
                subjects: vec![math.clone(), phys, networks, thermo],
                users: vec![meera, nameless],
                marks,
                attendance,
                resources,
            },
            math,
        }
    }

    #[tokio::test]
    async fn dashboard_classifies_student() {
        let fx = fixture();
        let view = student_dashboard(&fx.store, "CS001", &Thresholds::default())
            .await
            .unwrap();

        assert_eq!(view.entries.len(), 2);
        let insight = view.insight.unwrap();
        assert_eq!(insight.strongest_subject.subject.name, "Phys");
        assert_eq!(insight.strongest_subject.total_score, 45.0);
        assert!(insight.focus_area.is_none());
        assert_eq!(insight.attendance_alert().unwrap().0.name, "Math");
        assert_eq!(view.chart.unwrap().labels, vec!["MA301", "PH301"]);
    }

    #[tokio::test]
    async fn dashboard_derives_missing_attendance_from_records() {
        let fx = fixture();
        let view = student_dashboard(&fx.store, "CS002", &Thresholds::default())
            .await
            .unwrap();
        let math = view
            .entries
            .iter()
            .find(|entry| entry.subject.id == fx.math.id)
            .unwrap();
        assert_eq!(math.attendance_percentage, 75.0);
        assert!(!view.insight.unwrap().is_at_risk);
    }

    #[tokio::test]
    async fn dashboard_without_marks_is_an_empty_state() {
        let fx = fixture();
        let view = student_dashboard(&fx.store, "CS003", &Thresholds::default())
            .await
            .unwrap();
        assert!(view.entries.is_empty());
        assert!(view.insight.is_none());
        assert!(view.chart.is_none());
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let fx = fixture();
        let err = student_dashboard(&fx.store, "NOPE", &Thresholds::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AcademicError>(),
            Some(AcademicError::NotFound { entity: "student", .. })
        ));

        let err = student_attendance(&fx.store, "NOPE", None).await.unwrap_err();
        assert!(err.downcast_ref::<AcademicError>().is_some());
    }

    #[tokio::test]
    async fn malformed_mark_row_is_reported_with_context() {
        let mut fx = fixture();
        let asha_id = fx.store.students.lock().unwrap()[0].id;
        fx.store.marks.push((asha_id, RawMarkRow::default()));

        let err = student_dashboard(&fx.store, "CS001", &Thresholds::default())
            .await
            .unwrap_err();
        match err.downcast_ref::<AcademicError>() {
            Some(AcademicError::MalformedInput { student, .. }) => assert_eq!(student, "CS001"),
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn attendance_view_filters_and_summarizes() {
        let fx = fixture();
        let all = student_attendance(&fx.store, "CS001", None).await.unwrap();
        assert_eq!(all.stats.total, 3);
        assert_eq!(all.stats.present, 2);
        assert_eq!(all.stats.percentage, 66.67);
        assert_eq!(all.records[0].date, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());

        let math = student_attendance(&fx.store, "CS001", Some("MA301")).await.unwrap();
        assert_eq!(math.stats.total, 2);
        assert_eq!(math.stats.percentage, 50.0);

        let unknown = student_attendance(&fx.store, "CS001", Some("ZZ999")).await.unwrap();
        assert!(unknown.records.is_empty());
        assert_eq!(unknown.stats.percentage, 0.0);
    }

    #[tokio::test]
    async fn attendance_subject_filter_ignores_letter_case() {
        let fx = fixture();
        let upper = student_attendance(&fx.store, "CS001", Some("MA301")).await.unwrap();
        let lower = student_attendance(&fx.store, "CS001", Some("ma301")).await.unwrap();
        assert_eq!(lower.stats.total, 2);
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn faculty_lists_subjects_and_defaults_names() {
        let fx = fixture();
        let faculty = student_faculty(&fx.store, "CS001").await.unwrap();
        assert_eq!(faculty.len(), 2);
        let meera = faculty.iter().find(|f| f.name == "Meera Nair").unwrap();
        assert_eq!(meera.subjects, "Math, Phys");
        let nameless = faculty.iter().find(|f| f.name == UNKNOWN_FACULTY).unwrap();
        assert_eq!(nameless.subjects, "Networks");
    }

    #[test]
    fn only_faculty_role_is_listed() {
        let hod = faculty(Some("Head"), Role::Hod);
        let subjects = vec![subject("CS301", "DS", "CS", Some(hod.id))];
        assert!(faculty_details(&subjects, &[hod]).is_empty());
    }

    #[tokio::test]
    async fn resources_are_newest_first_and_filterable() {
        let fx = fixture();
        let all = student_resources(&fx.store, "CS001", &ResourceFilter::default())
            .await
            .unwrap();
        assert_eq!(all[0].title, "New assignment");
        assert_eq!(all.len(), 2);

        let notes = student_resources(
            &fx.store,
            "CS001",
            &ResourceFilter {
                subject_code: Some("MA301".to_string()),
                kind: Some("NOTES".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Old notes");
    }

    #[tokio::test]
    async fn profile_update_persists_supplied_fields() {
        let fx = fixture();
        let update = ProfileUpdate {
            parent_phone: Some("9888800000".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = update_profile(&fx.store, "CS001", &update).await.unwrap();
        assert_eq!(updated.parent_phone.as_deref(), Some("9888800000"));
        assert_eq!(updated.email.as_deref(), Some("CS001@sgp.edu.in"));

        let reloaded = fx.store.student("CS001").await.unwrap().unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn listing_includes_students_without_marks() {
        let fx = fixture();
        let listing = list_students(&fx.store, Some("CS")).await.unwrap();
        let regs: Vec<&str> = listing.iter().map(|l| l.student.reg_no.as_str()).collect();
        assert_eq!(regs, vec!["CS001", "CS002", "CS003"]);
        assert_eq!(listing[0].mark_count, 2);
        assert_eq!(listing[2].mark_count, 0);
    }

    #[tokio::test]
    async fn department_card_counts_faculty_through_subjects() {
        let fx = fixture();
        let card = department_card(&fx.store, "CS", None, &Thresholds::default())
            .await
            .unwrap();
        assert_eq!(card.name, "Computer Science");
        assert_eq!(card.stats.student_count, 3);
        assert_eq!(card.stats.faculty_count, 2);
        assert_eq!(card.stats.pass_percentage, 66.67);
        assert_eq!(card.stats.at_risk_count, 1);
    }

    #[tokio::test]
    async fn empty_department_has_zero_stats() {
        let fx = fixture();
        let card = department_card(&fx.store, "AU", Some(3), &Thresholds::default())
            .await
            .unwrap();
        assert_eq!(card.stats, DepartmentStats::default());
    }

    #[tokio::test]
    async fn institute_and_department_views_agree() {
        let fx = fixture();
        let thresholds = Thresholds::default();
        let summary = institute_summary(&fx.store, &thresholds).await.unwrap();

        let codes: Vec<&str> = summary.departments.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["CS", "ME"]);
        for card in &summary.departments {
            let direct = department_card(&fx.store, &card.code, None, &thresholds)
                .await
                .unwrap();
            assert_eq!(direct.stats, card.stats);
        }

        assert_eq!(summary.overall.student_count, 4);
        assert_eq!(summary.overall.at_risk_count, 2);
        assert_eq!(summary.overall.pass_percentage, 50.0);
        let flagged: Vec<&str> = summary
            .low_performers
            .iter()
            .map(|s| s.reg_no.as_str())
            .collect();
        assert_eq!(flagged, vec!["CS001", "ME001"]);
    }
}

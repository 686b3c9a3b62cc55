use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate;
use crate::models::{
    AttendanceRecord, AttendanceStatus, ProfileUpdate, RawMarkRow, Resource, ResourceFilter,
    StudentRecord, Subject, SubjectRef, UserRecord,
};
use crate::store::RecordStore;

const STUDENT_COLUMNS: &str =
    "st.id, st.reg_no, st.name, st.department, st.semester, st.section, \
     st.email, st.phone, st.parent_phone, st.address";

const MARK_COLUMNS: &str =
    "m.student_id, m.subject_id, sub.code AS subject_code, sub.name AS subject_name, \
     m.cie1_score, m.cie2_score, m.attendance_percentage";

const ATTENDANCE_COLUMNS: &str =
    "a.student_id, a.date, a.status, sub.id AS subject_id, \
     sub.code AS subject_code, sub.name AS subject_name";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub skipped: usize,
}

async fn upsert_user(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    department: Option<&str>,
    role: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO polytechnic.users (id, username, full_name, email, department, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (username) DO UPDATE
        SET full_name = EXCLUDED.full_name, department = EXCLUDED.department, role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(full_name)
    .bind(format!("{username}@sgp.edu.in"))
    .bind(department)
    .bind(role)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

async fn upsert_student(
    pool: &PgPool,
    reg_no: &str,
    name: &str,
    department: &str,
    semester: i32,
    section: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO polytechnic.students (id, reg_no, name, department, semester, section)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (reg_no) DO UPDATE
        SET name = EXCLUDED.name, department = EXCLUDED.department,
            semester = EXCLUDED.semester, section = EXCLUDED.section
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(reg_no)
    .bind(name)
    .bind(department)
    .bind(semester)
    .bind(section)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

async fn upsert_subject(
    pool: &PgPool,
    code: &str,
    name: &str,
    department: &str,
    semester: i32,
    instructor_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO polytechnic.subjects (id, code, name, department, semester, instructor_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (code) DO UPDATE
        SET name = EXCLUDED.name, department = EXCLUDED.department, semester = EXCLUDED.semester,
            instructor_id = COALESCE(EXCLUDED.instructor_id, polytechnic.subjects.instructor_id)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(name)
    .bind(department)
    .bind(semester)
    .bind(instructor_id)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

/// Inserts a mark entry or updates it in place on re-entry.
async fn upsert_mark(
    pool: &PgPool,
    student_id: Uuid,
    subject_id: Uuid,
    cie1_score: Option<f64>,
    cie2_score: Option<f64>,
    attendance_percentage: Option<f64>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO polytechnic.cie_marks
        (id, student_id, subject_id, cie1_score, cie2_score, attendance_percentage)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (student_id, subject_id) DO UPDATE
        SET cie1_score = EXCLUDED.cie1_score,
            cie2_score = EXCLUDED.cie2_score,
            attendance_percentage = EXCLUDED.attendance_percentage,
            updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(subject_id)
    .bind(cie1_score)
    .bind(cie2_score)
    .bind(attendance_percentage)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

async fn upsert_attendance(
    pool: &PgPool,
    student_id: Uuid,
    subject_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO polytechnic.attendance (id, student_id, subject_id, date, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, subject_id, date) DO UPDATE
        SET status = EXCLUDED.status
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(subject_id)
    .bind(date)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let faculty = vec![
        ("fac.jaffar", "MD Jaffar", "CS", "HOD"),
        ("fac.meera", "Meera Nair", "CS", "FACULTY"),
        ("fac.kumar", "R. Kumar", "ME", "FACULTY"),
        ("fac.anita", "Anita Roy", "EC", "FACULTY"),
    ];
    let mut instructor_ids = std::collections::HashMap::new();
    for (username, full_name, department, role) in faculty {
        let id = upsert_user(pool, username, full_name, Some(department), role).await?;
        instructor_ids.insert(username, id);
    }
    upsert_user(pool, "principal", "Gowri Shankar", None, "PRINCIPAL").await?;

    let subjects = vec![
        ("CS301", "Data Structures", "CS", 3, Some("fac.meera")),
        ("CS302", "Database Management Systems", "CS", 3, Some("fac.meera")),
        ("CS303", "Computer Networks", "CS", 3, None),
        ("ME301", "Thermodynamics", "ME", 3, Some("fac.kumar")),
        ("ME302", "Strength of Materials", "ME", 3, Some("fac.kumar")),
        ("EC301", "Digital Electronics", "EC", 3, Some("fac.anita")),
    ];
    let mut subject_ids = std::collections::HashMap::new();
    for (code, name, department, semester, instructor) in subjects {
        let instructor_id = instructor.and_then(|key| instructor_ids.get(key).copied());
        let id = upsert_subject(pool, code, name, department, semester, instructor_id).await?;
        subject_ids.insert(code, id);
    }

    let students = vec![
        ("SGP23CS001", "Asha Rao", "CS", 3, "A"),
        ("SGP23CS002", "Vikram Shetty", "CS", 3, "A"),
        ("SGP23CS003", "Neha Kulkarni", "CS", 3, "B"),
        ("SGP23ME001", "Rahul Patil", "ME", 3, "A"),
        ("SGP23ME002", "Sneha Gowda", "ME", 3, "A"),
        ("SGP23EC001", "Imran Khan", "EC", 3, "A"),
    ];
    let mut student_ids = std::collections::HashMap::new();
    for (reg_no, name, department, semester, section) in students {
        let id = upsert_student(pool, reg_no, name, department, semester, section).await?;
        student_ids.insert(reg_no, id);
    }

    let marks = vec![
        ("SGP23CS001", "CS301", Some(42.0), Some(38.0), Some(92.0)),
        ("SGP23CS001", "CS302", Some(35.0), Some(40.0), Some(88.0)),
        ("SGP23CS001", "CS303", Some(30.0), Some(33.0), Some(81.0)),
        ("SGP23CS002", "CS301", Some(20.0), Some(15.0), Some(70.0)),
        ("SGP23CS002", "CS302", Some(25.0), Some(20.0), Some(90.0)),
        ("SGP23CS003", "CS301", Some(12.0), Some(9.0), None),
        ("SGP23CS003", "CS302", Some(18.0), None, Some(64.5)),
        ("SGP23ME001", "ME301", Some(38.0), Some(41.0), Some(95.0)),
        ("SGP23ME001", "ME302", Some(33.0), Some(36.0), Some(90.0)),
        ("SGP23ME002", "ME301", Some(16.0), Some(14.0), Some(77.0)),
        ("SGP23ME002", "ME302", Some(28.0), Some(24.0), Some(72.0)),
    ];
    for (reg_no, code, cie1, cie2, attendance) in marks {
        let (Some(student_id), Some(subject_id)) = (student_ids.get(reg_no), subject_ids.get(code))
        else {
            continue;
        };
        upsert_mark(pool, *student_id, *subject_id, cie1, cie2, attendance).await?;
    }

    let start = NaiveDate::from_ymd_opt(2025, 9, 1).context("invalid date")?;
    let pattern = [true, true, false, true, true, false, true, false];
    for (offset, present) in pattern.iter().enumerate() {
        let date = start + chrono::Duration::days(offset as i64);
        let status = if *present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent
        };
        for (reg_no, code) in [("SGP23CS003", "CS301"), ("SGP23CS001", "CS301")] {
            let (Some(student_id), Some(subject_id)) =
                (student_ids.get(reg_no), subject_ids.get(code))
            else {
                continue;
            };
            upsert_attendance(pool, *student_id, *subject_id, date, status).await?;
        }
    }

    let resources = vec![
        ("Linked list notes", "NOTES", "CS", 3, Some("CS301"), "fac.meera", "https://lms.sgp.edu.in/cs301/lists.pdf"),
        ("SQL practice set", "ASSIGNMENT", "CS", 3, Some("CS302"), "fac.meera", "https://lms.sgp.edu.in/cs302/sql.pdf"),
        ("Semester 3 question bank", "QUESTION_PAPER", "CS", 3, None, "fac.jaffar", "https://lms.sgp.edu.in/cs/sem3-qb.pdf"),
        ("Steam tables", "NOTES", "ME", 3, Some("ME301"), "fac.kumar", "https://lms.sgp.edu.in/me301/steam.pdf"),
    ];
    for (title, kind, department, semester, subject, uploader, url) in resources {
        sqlx::query(
            r#"
            INSERT INTO polytechnic.resources
            (id, title, kind, department, semester, subject_id, uploaded_by, url)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM polytechnic.resources WHERE url = $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(kind)
        .bind(department)
        .bind(semester)
        .bind(subject.and_then(|code| subject_ids.get(code).copied()))
        .bind(instructor_ids.get(uploader).copied())
        .bind(url)
        .execute(pool)
        .await?;
    }

    info!(
        students = student_ids.len(),
        subjects = subject_ids.len(),
        "seed data applied"
    );
    Ok(())
}

pub async fn import_marks_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        reg_no: String,
        name: String,
        department: String,
        semester: i32,
        section: Option<String>,
        subject_code: String,
        subject_name: String,
        cie1_score: Option<f64>,
        cie2_score: Option<f64>,
        attendance_percentage: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid mark row {}", line + 1))?;

        let check = RawMarkRow {
            subject_id: Some(Uuid::nil()),
            subject_code: Some(row.subject_code.clone()),
            subject_name: Some(row.subject_name.clone()),
            cie1_score: row.cie1_score,
            cie2_score: row.cie2_score,
            attendance_percentage: row.attendance_percentage,
        };
        if let Err(err) = aggregate::normalize_mark_row(&row.reg_no, &check, 0.0) {
            warn!(line = line + 1, error = %err, "skipping mark row");
            summary.skipped += 1;
            continue;
        }

        let student_id = upsert_student(
            pool,
            &row.reg_no,
            &row.name,
            &row.department,
            row.semester,
            row.section.as_deref().unwrap_or("A"),
        )
        .await?;
        let subject_id = upsert_subject(
            pool,
            row.subject_code.trim(),
            &row.subject_name,
            &row.department,
            row.semester,
            None,
        )
        .await?;

        let affected = upsert_mark(
            pool,
            student_id,
            subject_id,
            row.cie1_score,
            row.cie2_score,
            row.attendance_percentage,
        )
        .await?;
        if affected > 0 {
            summary.applied += 1;
        }
    }

    info!(applied = summary.applied, skipped = summary.skipped, "mark import finished");
    Ok(summary)
}

pub async fn import_attendance_csv(
    pool: &PgPool,
    csv_path: &Path,
) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        reg_no: String,
        subject_code: String,
        date: NaiveDate,
        status: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid attendance row {}", line + 1))?;
        let status = match row.status.parse::<AttendanceStatus>() {
            Ok(status) => status,
            Err(reason) => {
                warn!(line = line + 1, %reason, "skipping attendance row");
                summary.skipped += 1;
                continue;
            }
        };

        let ids = sqlx::query(
            r#"
            SELECT st.id AS student_id, sub.id AS subject_id
            FROM polytechnic.students st, polytechnic.subjects sub
            WHERE st.reg_no = $1 AND sub.code = $2
            "#,
        )
        .bind(&row.reg_no)
        .bind(row.subject_code.trim())
        .fetch_optional(pool)
        .await?;

        let Some(ids) = ids else {
            warn!(
                line = line + 1,
                reg_no = %row.reg_no,
                subject = %row.subject_code,
                "skipping attendance row for unknown student or subject"
            );
            summary.skipped += 1;
            continue;
        };

        let affected = upsert_attendance(
            pool,
            ids.try_get("student_id")?,
            ids.try_get("subject_id")?,
            row.date,
            status,
        )
        .await?;
        if affected > 0 {
            summary.applied += 1;
        }
    }

    info!(applied = summary.applied, skipped = summary.skipped, "attendance import finished");
    Ok(summary)
}

fn student_from_row(row: &PgRow) -> Result<StudentRecord, sqlx::Error> {
    Ok(StudentRecord {
        id: row.try_get("id")?,
        reg_no: row.try_get("reg_no")?,
        name: row.try_get("name")?,
        department: row.try_get("department")?,
        semester: row.try_get("semester")?,
        section: row.try_get("section")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        parent_phone: row.try_get("parent_phone")?,
        address: row.try_get("address")?,
    })
}

fn mark_row_from_row(row: &PgRow) -> Result<RawMarkRow, sqlx::Error> {
    Ok(RawMarkRow {
        subject_id: row.try_get("subject_id")?,
        subject_code: row.try_get("subject_code")?,
        subject_name: row.try_get("subject_name")?,
        cie1_score: row.try_get("cie1_score")?,
        cie2_score: row.try_get("cie2_score")?,
        attendance_percentage: row.try_get("attendance_percentage")?,
    })
}

fn attendance_from_row(row: &PgRow) -> anyhow::Result<AttendanceRecord> {
    let status: String = row.try_get("status")?;
    Ok(AttendanceRecord {
        student_id: row.try_get("student_id")?,
        subject: SubjectRef {
            id: row.try_get("subject_id")?,
            code: row.try_get("subject_code")?,
            name: row.try_get("subject_name")?,
        },
        date: row.try_get("date")?,
        status: status.parse().map_err(anyhow::Error::msg)?,
    })
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn student(&self, reg_no: &str) -> anyhow::Result<Option<StudentRecord>> {
        debug!(reg_no, "fetching student");
        let query = format!("SELECT {STUDENT_COLUMNS} FROM polytechnic.students st WHERE st.reg_no = $1");
        let row = sqlx::query(&query)
            .bind(reg_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(student_from_row).transpose()?)
    }

    async fn mark_rows(&self, student_id: Uuid) -> anyhow::Result<Vec<RawMarkRow>> {
        let query = format!(
            "SELECT {MARK_COLUMNS} FROM polytechnic.cie_marks m \
             LEFT JOIN polytechnic.subjects sub ON sub.id = m.subject_id \
             WHERE m.student_id = $1"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        debug!(%student_id, rows = rows.len(), "fetched mark rows");
        Ok(rows
            .iter()
            .map(mark_row_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn attendance(
        &self,
        student_id: Uuid,
        subject_code: Option<&str>,
    ) -> anyhow::Result<Vec<AttendanceRecord>> {
        let mut query = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM polytechnic.attendance a \
             JOIN polytechnic.subjects sub ON sub.id = a.subject_id \
             WHERE a.student_id = $1"
        );
        if subject_code.is_some() {
            query.push_str(" AND UPPER(sub.code) = UPPER($2)");
        }
        query.push_str(" ORDER BY a.date DESC");

        let mut rows = sqlx::query(&query).bind(student_id);
        if let Some(code) = subject_code {
            rows = rows.bind(code);
        }

        let records = rows.fetch_all(&self.pool).await?;
        debug!(%student_id, rows = records.len(), "fetched attendance");
        records.iter().map(attendance_from_row).collect()
    }

    async fn students(&self, department: Option<&str>) -> anyhow::Result<Vec<StudentRecord>> {
        let mut query = format!("SELECT {STUDENT_COLUMNS} FROM polytechnic.students st");
        if department.is_some() {
            query.push_str(" WHERE st.department = $1");
        }
        query.push_str(" ORDER BY st.reg_no ASC");

        let mut rows = sqlx::query(&query);
        if let Some(value) = department {
            rows = rows.bind(value);
        }

        let records = rows.fetch_all(&self.pool).await?;
        Ok(records
            .iter()
            .map(student_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn scope_mark_rows(
        &self,
        department: Option<&str>,
    ) -> anyhow::Result<Vec<(Uuid, RawMarkRow)>> {
        let mut query = format!(
            "SELECT {MARK_COLUMNS} FROM polytechnic.cie_marks m \
             JOIN polytechnic.students st ON st.id = m.student_id \
             LEFT JOIN polytechnic.subjects sub ON sub.id = m.subject_id"
        );
        if department.is_some() {
            query.push_str(" WHERE st.department = $1");
        }

        let mut rows = sqlx::query(&query);
        if let Some(value) = department {
            rows = rows.bind(value);
        }

        let records = rows.fetch_all(&self.pool).await?;
        debug!(?department, rows = records.len(), "fetched scope mark rows");
        records
            .iter()
            .map(|row| -> anyhow::Result<(Uuid, RawMarkRow)> {
                Ok((row.try_get("student_id")?, mark_row_from_row(row)?))
            })
            .collect()
    }

    async fn scope_attendance(
        &self,
        department: Option<&str>,
    ) -> anyhow::Result<Vec<AttendanceRecord>> {
        let mut query = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM polytechnic.attendance a \
             JOIN polytechnic.students st ON st.id = a.student_id \
             JOIN polytechnic.subjects sub ON sub.id = a.subject_id"
        );
        if department.is_some() {
            query.push_str(" WHERE st.department = $1");
        }

        let mut rows = sqlx::query(&query);
        if let Some(value) = department {
            rows = rows.bind(value);
        }

        let records = rows.fetch_all(&self.pool).await?;
        records.iter().map(attendance_from_row).collect()
    }

    async fn subjects(
        &self,
        department: Option<&str>,
        semester: Option<i32>,
    ) -> anyhow::Result<Vec<Subject>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, code, name, department, semester, instructor_id \
             FROM polytechnic.subjects WHERE TRUE",
        );
        if let Some(value) = department {
            builder.push(" AND department = ").push_bind(value);
        }
        if let Some(value) = semester {
            builder.push(" AND semester = ").push_bind(value);
        }
        builder.push(" ORDER BY code");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> anyhow::Result<Subject> {
                Ok(Subject {
                    id: row.try_get("id")?,
                    code: row.try_get("code")?,
                    name: row.try_get("name")?,
                    department: row.try_get("department")?,
                    semester: row.try_get("semester")?,
                    instructor_id: row.try_get("instructor_id")?,
                })
            })
            .collect()
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>> {
        let rows = sqlx::query(
            "SELECT id, username, full_name, email, department, role \
             FROM polytechnic.users WHERE id = ANY($1) ORDER BY username",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> anyhow::Result<UserRecord> {
                let role: String = row.try_get("role")?;
                Ok(UserRecord {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                    full_name: row.try_get("full_name")?,
                    email: row.try_get("email")?,
                    department: row.try_get("department")?,
                    role: role.parse().map_err(anyhow::Error::msg)?,
                })
            })
            .collect()
    }

    async fn resources(
        &self,
        student: &StudentRecord,
        filter: &ResourceFilter,
    ) -> anyhow::Result<Vec<Resource>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT r.id, r.title, r.kind, r.department, r.semester, r.url, r.created_at, \
             sub.id AS subject_id, sub.code AS subject_code, sub.name AS subject_name, \
             u.username AS uploader \
             FROM polytechnic.resources r \
             LEFT JOIN polytechnic.subjects sub ON sub.id = r.subject_id \
             LEFT JOIN polytechnic.users u ON u.id = r.uploaded_by WHERE ",
        );
        match filter.subject_code.as_deref() {
            Some(code) => {
                builder.push("sub.code = ").push_bind(code);
            }
            None => {
                builder
                    .push("r.department = ")
                    .push_bind(&student.department)
                    .push(" AND r.semester = ")
                    .push_bind(student.semester);
            }
        }
        if let Some(kind) = filter.kind.as_deref() {
            builder.push(" AND r.kind = ").push_bind(kind);
        }
        builder.push(" ORDER BY r.created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> anyhow::Result<Resource> {
                let subject_id: Option<Uuid> = row.try_get("subject_id")?;
                let subject = match subject_id {
                    Some(id) => Some(SubjectRef {
                        id,
                        code: row.try_get("subject_code")?,
                        name: row.try_get("subject_name")?,
                    }),
                    None => None,
                };
                Ok(Resource {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    kind: row.try_get("kind")?,
                    department: row.try_get("department")?,
                    semester: row.try_get("semester")?,
                    subject,
                    uploader: row.try_get("uploader")?,
                    url: row.try_get("url")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn update_profile(
        &self,
        student: &StudentRecord,
        update: &ProfileUpdate,
    ) -> anyhow::Result<StudentRecord> {
        let next = update.apply(student);
        let query = format!(
            "UPDATE polytechnic.students st \
             SET email = $2, phone = $3, parent_phone = $4, address = $5 \
             WHERE st.id = $1 RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(student.id)
            .bind(&next.email)
            .bind(&next.phone)
            .bind(&next.parent_phone)
            .bind(&next.address)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to update profile of {}", student.reg_no))?;
        info!(reg_no = %student.reg_no, "student profile updated");
        Ok(student_from_row(&row)?)
    }
}

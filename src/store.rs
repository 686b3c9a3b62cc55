use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AttendanceRecord, ProfileUpdate, RawMarkRow, Resource, ResourceFilter, StudentRecord, Subject,
    UserRecord,
};

/// Read/write access to the academic records. `department: None` means the
/// whole institute.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn student(&self, reg_no: &str) -> anyhow::Result<Option<StudentRecord>>;

    async fn mark_rows(&self, student_id: Uuid) -> anyhow::Result<Vec<RawMarkRow>>;

    async fn attendance(
        &self,
        student_id: Uuid,
        subject_code: Option<&str>,
    ) -> anyhow::Result<Vec<AttendanceRecord>>;

    async fn students(&self, department: Option<&str>) -> anyhow::Result<Vec<StudentRecord>>;

    /// Mark rows of every student in scope, keyed by student id.
    async fn scope_mark_rows(
        &self,
        department: Option<&str>,
    ) -> anyhow::Result<Vec<(Uuid, RawMarkRow)>>;

    async fn scope_attendance(
        &self,
        department: Option<&str>,
    ) -> anyhow::Result<Vec<AttendanceRecord>>;

    async fn subjects(
        &self,
        department: Option<&str>,
        semester: Option<i32>,
    ) -> anyhow::Result<Vec<Subject>>;

    async fn users_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>>;

    async fn resources(
        &self,
        student: &StudentRecord,
        filter: &ResourceFilter,
    ) -> anyhow::Result<Vec<Resource>>;

    async fn update_profile(
        &self,
        student: &StudentRecord,
        update: &ProfileUpdate,
    ) -> anyhow::Result<StudentRecord>;
}

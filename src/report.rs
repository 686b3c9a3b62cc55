use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::dashboard::StudentDashboard;
use crate::models::{
    AttendanceSignal, DepartmentCard, DepartmentStats, FacultyDetail, InstituteSummary, Resource,
    StudentAttendance, StudentListing, StudentRecord, SubjectChart, CIE_MAX, TOTAL_MAX,
};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Who is looking and how they want it. Passed into every render call.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub viewer: Option<String>,
    pub format: OutputFormat,
}

impl RenderContext {
    fn render<T: Serialize>(
        &self,
        title: &str,
        value: &T,
        body: impl FnOnce(&mut String),
    ) -> anyhow::Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(value)?);
        }

        let mut output = String::new();
        let _ = writeln!(output, "# {title}");
        if let Some(viewer) = &self.viewer {
            let _ = writeln!(output, "Prepared for {viewer}");
        }
        let _ = writeln!(output);
        body(&mut output);
        Ok(output)
    }
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn write_chart(output: &mut String, chart: &SubjectChart) {
    let _ = writeln!(output, "## Performance Trend (CIE 1 vs CIE 2)");
    for (i, label) in chart.labels.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:<8} {:<18} CIE-1 {} {:>4}  CIE-2 {} {:>4}",
            label,
            chart.short_names[i],
            bar(chart.cie1[i], CIE_MAX),
            chart.cie1[i],
            bar(chart.cie2[i], CIE_MAX),
            chart.cie2[i]
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance by Subject");
    for (i, label) in chart.labels.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:<8} {} {:>6}%{}",
            label,
            bar(chart.attendance[i], 100.0),
            chart.attendance[i],
            if chart.low_attendance[i] { "  LOW" } else { "" }
        );
    }
}

pub fn render_student_dashboard(
    ctx: &RenderContext,
    view: &StudentDashboard,
) -> anyhow::Result<String> {
    ctx.render("Student Dashboard", view, |output| {
        let student = &view.student;
        let _ = writeln!(
            output,
            "{} ({}) | {}, semester {}, section {}",
            student.name, student.reg_no, student.department, student.semester, student.section
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "## CIE Marks");

        if view.entries.is_empty() {
            let _ = writeln!(output, "No marks recorded yet.");
            return;
        }
        for entry in &view.entries {
            let _ = writeln!(
                output,
                "- {} {}: CIE-1 {}/{}, CIE-2 {}/{}, total {}/{}, attendance {}%",
                entry.subject.code,
                entry.subject.name,
                entry.cie1_score,
                CIE_MAX,
                entry.cie2_score,
                CIE_MAX,
                entry.total_score,
                TOTAL_MAX,
                entry.attendance_percentage
            );
        }

        if let Some(insight) = &view.insight {
            let _ = writeln!(output);
            let _ = writeln!(output, "## Academic Analysis");
            let _ = writeln!(
                output,
                "- Strongest subject: {} with {}/{}",
                insight.strongest_subject.subject.name,
                insight.strongest_subject.total_score,
                TOTAL_MAX
            );
            if let Some(focus) = &insight.focus_area {
                let _ = writeln!(
                    output,
                    "- Focus area: review {} to improve your score ({}/{})",
                    focus.subject.name, focus.total_score, TOTAL_MAX
                );
            }
            match &insight.attendance {
                AttendanceSignal::Alert {
                    subject,
                    percentage,
                } => {
                    let _ = writeln!(
                        output,
                        "- Attendance alert: {}% in {}, attend upcoming classes",
                        percentage, subject.name
                    );
                }
                AttendanceSignal::GoodStanding => {
                    let _ = writeln!(
                        output,
                        "- Attendance status: good attendance across all subjects"
                    );
                }
            }
            if insight.is_at_risk {
                let _ = writeln!(output, "- At risk: {}", insight.risk_reasons().join("; "));
            }
        }

        if let Some(chart) = &view.chart {
            let _ = writeln!(output);
            write_chart(output, chart);
        }
    })
}

pub fn render_attendance(
    ctx: &RenderContext,
    reg_no: &str,
    view: &StudentAttendance,
) -> anyhow::Result<String> {
    ctx.render("Attendance", view, |output| {
        let stats = &view.stats;
        let _ = writeln!(
            output,
            "{reg_no}: {} of {} classes attended ({} absent), {}%",
            stats.present, stats.total, stats.absent, stats.percentage
        );
        let _ = writeln!(output);

        if view.records.is_empty() {
            let _ = writeln!(output, "No attendance recorded for this selection.");
            return;
        }
        for record in &view.records {
            let _ = writeln!(
                output,
                "- {} {} ({}): {}",
                record.date, record.subject.code, record.subject.name, record.status
            );
        }
    })
}

pub fn render_faculty(ctx: &RenderContext, faculty: &[FacultyDetail]) -> anyhow::Result<String> {
    ctx.render("My Faculty", &faculty, |output| {
        if faculty.is_empty() {
            let _ = writeln!(output, "No instructors assigned yet.");
            return;
        }
        for member in faculty {
            let _ = writeln!(
                output,
                "- {} <{}>: {}",
                member.name,
                member.email.as_deref().unwrap_or("no email"),
                member.subjects
            );
        }
    })
}

pub fn render_resources(ctx: &RenderContext, resources: &[Resource]) -> anyhow::Result<String> {
    ctx.render("Resources", &resources, |output| {
        if resources.is_empty() {
            let _ = writeln!(output, "No resources shared yet.");
            return;
        }
        for resource in resources {
            let subject = resource
                .subject
                .as_ref()
                .map(|s| s.code.as_str())
                .unwrap_or("general");
            let _ = writeln!(
                output,
                "- [{}] {} ({}) {} uploaded {} by {}",
                resource.kind,
                resource.title,
                subject,
                resource.url,
                resource.created_at.date_naive(),
                resource.uploader.as_deref().unwrap_or("unknown")
            );
        }
    })
}

pub fn render_profile(ctx: &RenderContext, student: &StudentRecord) -> anyhow::Result<String> {
    ctx.render("Profile", student, |output| {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        let _ = writeln!(output, "{} ({})", student.name, student.reg_no);
        let _ = writeln!(output, "- Email: {}", field(&student.email));
        let _ = writeln!(output, "- Phone: {}", field(&student.phone));
        let _ = writeln!(output, "- Parent phone: {}", field(&student.parent_phone));
        let _ = writeln!(output, "- Address: {}", field(&student.address));
    })
}

pub fn render_students(
    ctx: &RenderContext,
    department: Option<&str>,
    students: &[StudentListing],
) -> anyhow::Result<String> {
    ctx.render("Students", &students, |output| {
        let _ = writeln!(
            output,
            "{} students in {}",
            students.len(),
            department.unwrap_or("all departments")
        );
        let _ = writeln!(output);
        for listing in students {
            let student = &listing.student;
            let _ = writeln!(
                output,
                "- {} {} ({}, sem {}, sec {}) {} subjects marked",
                student.reg_no,
                student.name,
                student.department,
                student.semester,
                student.section,
                listing.mark_count
            );
        }
    })
}

fn write_stats(output: &mut String, stats: &DepartmentStats) {
    let _ = writeln!(output, "- Students: {}", stats.student_count);
    let _ = writeln!(output, "- Faculty: {}", stats.faculty_count);
    let _ = writeln!(output, "- At risk: {}", stats.at_risk_count);
    let _ = writeln!(
        output,
        "- Pass percentage: {}% {}",
        stats.pass_percentage,
        bar(stats.pass_percentage, 100.0)
    );
    let _ = writeln!(output, "- Avg CIE performance: {}%", stats.average_percentage);
}

pub fn render_department(ctx: &RenderContext, card: &DepartmentCard) -> anyhow::Result<String> {
    ctx.render("Department Monitoring", card, |output| {
        let _ = writeln!(output, "## {} ({})", card.name, card.code);
        write_stats(output, &card.stats);
    })
}

pub fn render_institute(ctx: &RenderContext, summary: &InstituteSummary) -> anyhow::Result<String> {
    ctx.render("Institute Overview", summary, |output| {
        let _ = writeln!(output, "## Institute");
        write_stats(output, &summary.overall);

        for card in &summary.departments {
            let _ = writeln!(output);
            let _ = writeln!(output, "## {} ({})", card.name, card.code);
            write_stats(output, &card.stats);
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Low Performers");
        if summary.low_performers.is_empty() {
            let _ = writeln!(output, "No students flagged for intervention.");
        } else {
            for student in &summary.low_performers {
                let _ = writeln!(
                    output,
                    "- {} {} ({}): {}",
                    student.reg_no,
                    student.name,
                    student.department,
                    student.reasons.join("; ")
                );
            }
        }
    })
}

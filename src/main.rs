use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod aggregate;
mod config;
mod dashboard;
mod db;
mod error;
mod insight;
mod models;
mod report;
mod rollup;
mod store;

use config::{StoreConfig, Thresholds};
use models::{ProfileUpdate, ResourceFilter};
use report::{OutputFormat, RenderContext};

#[derive(Parser)]
#[command(name = "polytechnic-academics")]
#[command(about = "Academic records and analytics for polytechnic dashboards", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreConfig,
    #[command(flatten)]
    thresholds: Thresholds,
    /// Output format for rendered views
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// Name shown on rendered views
    #[arg(long, env = "ACADEMICS_VIEWER", global = true)]
    viewer: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import or re-enter CIE marks from a CSV file
    ImportMarks {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import attendance records from a CSV file
    ImportAttendance {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Student dashboard with marks, insights and charts
    Dashboard {
        #[arg(long)]
        reg_no: String,
    },
    /// Attendance records and summary, newest first
    Attendance {
        #[arg(long)]
        reg_no: String,
        /// Subject code to filter on
        #[arg(long)]
        subject: Option<String>,
    },
    /// Instructors teaching the student's subjects
    Faculty {
        #[arg(long)]
        reg_no: String,
    },
    /// Learning resources shared with the student
    Resources {
        #[arg(long)]
        reg_no: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        kind: Option<String>,
    },
    /// Update contact details, keeping fields that are not given
    UpdateProfile {
        #[arg(long)]
        reg_no: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        parent_phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List students with their mark counts
    Students {
        #[arg(long)]
        department: Option<String>,
    },
    /// Statistics card for one department
    Department {
        #[arg(long)]
        code: String,
        #[arg(long)]
        semester: Option<i32>,
    },
    /// Institute overview for the principal
    Institute,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ACADEMICS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("polytechnic_academics=info"));
    let json = std::env::var("ACADEMICS_LOG_JSON")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

async fn connect(config: &StoreConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.thresholds.validate()?;

    let ctx = RenderContext {
        viewer: cli.viewer.clone(),
        format: cli.format,
    };
    let thresholds = cli.thresholds;
    let pool = connect(&cli.store).await?;
    let store = db::PgStore::new(pool);

    let output = match cli.command {
        Commands::InitDb => {
            db::init_db(store.pool()).await?;
            "Schema ready.".to_string()
        }
        Commands::Seed => {
            db::seed(store.pool()).await?;
            "Seed data inserted.".to_string()
        }
        Commands::ImportMarks { csv } => {
            let summary = db::import_marks_csv(store.pool(), &csv).await?;
            format!(
                "Applied {} mark entries from {} ({} skipped).",
                summary.applied,
                csv.display(),
                summary.skipped
            )
        }
        Commands::ImportAttendance { csv } => {
            let summary = db::import_attendance_csv(store.pool(), &csv).await?;
            format!(
                "Applied {} attendance records from {} ({} skipped).",
                summary.applied,
                csv.display(),
                summary.skipped
            )
        }
        Commands::Dashboard { reg_no } => {
            let view = dashboard::student_dashboard(&store, &reg_no, &thresholds).await?;
            report::render_student_dashboard(&ctx, &view)?
        }
        Commands::Attendance { reg_no, subject } => {
            let view = dashboard::student_attendance(&store, &reg_no, subject.as_deref()).await?;
            report::render_attendance(&ctx, &reg_no, &view)?
        }
        Commands::Faculty { reg_no } => {
            let faculty = dashboard::student_faculty(&store, &reg_no).await?;
            report::render_faculty(&ctx, &faculty)?
        }
        Commands::Resources {
            reg_no,
            subject,
            kind,
        } => {
            let filter = ResourceFilter {
                subject_code: subject,
                kind,
            };
            let resources = dashboard::student_resources(&store, &reg_no, &filter).await?;
            report::render_resources(&ctx, &resources)?
        }
        Commands::UpdateProfile {
            reg_no,
            email,
            phone,
            parent_phone,
            address,
        } => {
            let update = ProfileUpdate {
                email,
                phone,
                parent_phone,
                address,
            };
            let student = dashboard::update_profile(&store, &reg_no, &update).await?;
            report::render_profile(&ctx, &student)?
        }
        Commands::Students { department } => {
            let students = dashboard::list_students(&store, department.as_deref()).await?;
            report::render_students(&ctx, department.as_deref(), &students)?
        }
        Commands::Department { code, semester } => {
            let card = dashboard::department_card(&store, &code, semester, &thresholds).await?;
            report::render_department(&ctx, &card)?
        }
        Commands::Institute => {
            let summary = dashboard::institute_summary(&store, &thresholds).await?;
            report::render_institute(&ctx, &summary)?
        }
    };

    println!("{output}");
    Ok(())
}

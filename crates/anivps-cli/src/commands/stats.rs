//! Usage analytics.

use chrono::{FixedOffset, Utc};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use anivps_core::config::AppConfig;
use anivps_core::error::AppError;
use anivps_database::SessionFilter;
use anivps_service::session::analytics;

use super::CliContext;
use crate::output::{self, OutputFormat};

/// Arguments for the stats command
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Restrict to one owner; every session otherwise
    #[arg(long)]
    pub user: Option<Uuid>,
    /// UTC offset in minutes used for calendar days
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Serialize, Tabled)]
struct BucketRow {
    group: String,
    value: String,
    sessions: u64,
}

/// Print rollups over the selected sessions
pub async fn execute(
    args: &StatsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let offset = FixedOffset::east_opt(args.tz_offset_minutes * 60)
        .ok_or_else(|| AppError::validation("UTC offset is out of range"))?;

    let ctx = CliContext::connect(config).await?;
    let filter = SessionFilter {
        user_id: args.user,
        ..SessionFilter::default()
    };
    let sessions = ctx.sessions.find_by_filter(&filter).await?;
    let report = analytics::compute(&sessions, Utc::now(), offset);

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_kv("Total", &report.total_sessions.to_string());
            output::print_kv("Active", &report.active_sessions.to_string());
            output::print_kv("Failed", &report.failed_sessions.to_string());
            output::print_kv("Success rate", &format!("{:.1}%", report.success_rate));
            output::print_kv("Total uptime (min)", &report.total_uptime_minutes.to_string());
            output::print_kv(
                "Avg duration (min)",
                &format!("{:.1}", report.avg_session_duration),
            );
            println!();

            let groups = [
                ("os", &report.sessions_by_os),
                ("networking", &report.sessions_by_networking),
                ("tier", &report.sessions_by_config),
            ];
            let mut rows: Vec<BucketRow> = groups
                .iter()
                .flat_map(|(group, buckets)| {
                    buckets.iter().map(move |(value, count)| BucketRow {
                        group: group.to_string(),
                        value: value.clone(),
                        sessions: *count,
                    })
                })
                .collect();
            rows.extend(report.daily_usage.iter().map(|day| BucketRow {
                group: "day".to_string(),
                value: day.date.to_string(),
                sessions: day.count,
            }));
            output::print_list(&rows, format);
        }
    }

    ctx.db.close().await;
    Ok(())
}

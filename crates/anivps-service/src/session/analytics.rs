//! Usage rollups over a user's sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use anivps_entity::session::{SessionStatus, VpsSession};

/// Days covered by [`SessionAnalytics::daily_usage`].
pub const DAILY_USAGE_DAYS: i64 = 7;

/// Bucket for sessions without a recorded profile value.
const UNKNOWN: &str = "unknown";

/// Sessions created on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub count: u64,
}

/// Aggregates served by the analytics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAnalytics {
    pub total_sessions: u64,
    /// Active and connected.
    pub active_sessions: u64,
    pub failed_sessions: u64,
    /// Percentage of sessions that reached `connected` or `killed`, one
    /// decimal.
    pub success_rate: f64,
    pub sessions_by_os: BTreeMap<String, u64>,
    pub sessions_by_networking: BTreeMap<String, u64>,
    pub sessions_by_config: BTreeMap<String, u64>,
    pub total_uptime_minutes: i64,
    /// Mean uptime per session in minutes, one decimal.
    pub avg_session_duration: f64,
    /// Oldest day first, ending with today in the caller's offset.
    pub daily_usage: Vec<DailyUsage>,
}

/// Compute rollups over `sessions` as seen at `now` from `offset`.
pub fn compute(
    sessions: &[VpsSession],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> SessionAnalytics {
    let total = sessions.len() as u64;
    let count = |pred: fn(&VpsSession) -> bool| sessions.iter().filter(|s| pred(*s)).count() as u64;

    let active = count(|s| s.is_active && s.status == SessionStatus::Connected);
    let failed = count(|s| s.status == SessionStatus::Failed);
    let succeeded = count(|s| matches!(s.status, SessionStatus::Connected | SessionStatus::Killed));

    let mut by_os = BTreeMap::new();
    let mut by_networking = BTreeMap::new();
    let mut by_config = BTreeMap::new();
    for s in sessions {
        bump(&mut by_os, s.os_type.map(|v| v.as_str()));
        bump(&mut by_networking, s.networking_type.map(|v| v.as_str()));
        bump(&mut by_config, s.vps_config.map(|v| v.as_str()));
    }

    let total_uptime: i64 = sessions.iter().map(|s| i64::from(s.total_uptime_minutes)).sum();

    SessionAnalytics {
        total_sessions: total,
        active_sessions: active,
        failed_sessions: failed,
        success_rate: percentage(succeeded, total),
        sessions_by_os: by_os,
        sessions_by_networking: by_networking,
        sessions_by_config: by_config,
        total_uptime_minutes: total_uptime,
        avg_session_duration: if total == 0 {
            0.0
        } else {
            round1(total_uptime as f64 / total as f64)
        },
        daily_usage: daily_usage(sessions, now, offset),
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: Option<&str>) {
    *map.entry(key.unwrap_or(UNKNOWN).to_string()).or_insert(0) += 1;
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 * 100.0 / total as f64)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn daily_usage(
    sessions: &[VpsSession],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<DailyUsage> {
    let today = now.with_timezone(&offset).date_naive();
    let mut buckets: Vec<DailyUsage> = (0..DAILY_USAGE_DAYS)
        .rev()
        .map(|back| DailyUsage {
            date: today - Duration::days(back),
            count: 0,
        })
        .collect();

    for s in sessions {
        let day = s.created_at.with_timezone(&offset).date_naive();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.date == day) {
            bucket.count += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use anivps_entity::session::{NetworkingType, OsType, ProvisionPhase, VpsTier};
    use uuid::Uuid;

    fn session(phase: ProvisionPhase, created_at: DateTime<Utc>) -> VpsSession {
        VpsSession {
            id: Uuid::new_v4(),
            user_id: None,
            github_repo: format!("octo/vps-{}", Uuid::new_v4().simple()),
            repo_url: None,
            default_branch: None,
            os_type: None,
            vps_config: None,
            networking_type: None,
            status: phase.status(),
            phase,
            is_active: true,
            workflow_run_id: None,
            poll_attempts: 0,
            next_poll_at: None,
            dispatched_at: None,
            rdp_address: None,
            rdp_username: None,
            rdp_password: None,
            console_url: None,
            created_at,
            provisioning_started_at: created_at,
            started_at: None,
            expires_at: created_at + Duration::hours(6),
            updated_at: created_at,
            total_uptime_minutes: 0,
            connection_count: 0,
        }
    }

    #[test]
    fn test_success_rate_counts_connected_and_killed() {
        let now = Utc::now();
        let mut sessions = Vec::new();
        sessions.extend((0..6).map(|_| session(ProvisionPhase::Ready, now)));
        sessions.push(session(ProvisionPhase::Killed, now));
        sessions.extend((0..3).map(|_| session(ProvisionPhase::Failed, now)));

        let stats = compute(&sessions, now, FixedOffset::east_opt(0).unwrap());
        assert_eq!(stats.total_sessions, 10);
        assert_eq!(stats.active_sessions, 6);
        assert_eq!(stats.failed_sessions, 3);
        assert_eq!(stats.success_rate, 70.0);
    }

    #[test]
    fn test_groupings_sum_to_total() {
        let now = Utc::now();
        let mut a = session(ProvisionPhase::Ready, now);
        a.os_type = Some(OsType::Windows);
        a.vps_config = Some(VpsTier::Premium);
        a.networking_type = Some(NetworkingType::Ngrok);
        let mut b = session(ProvisionPhase::Polling, now);
        b.os_type = Some(OsType::Ubuntu);
        let c = session(ProvisionPhase::Failed, now);

        let stats = compute(&[a, b, c], now, FixedOffset::east_opt(0).unwrap());
        for grouping in [
            &stats.sessions_by_os,
            &stats.sessions_by_networking,
            &stats.sessions_by_config,
        ] {
            assert_eq!(grouping.values().sum::<u64>(), 3);
        }
        assert_eq!(stats.sessions_by_config.get("unknown"), Some(&2));
        assert_eq!(stats.sessions_by_os.get("windows"), Some(&1));
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let now = Utc::now();
        let stats = compute(&[], now, FixedOffset::east_opt(0).unwrap());
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_session_duration, 0.0);
        assert_eq!(stats.daily_usage.len(), 7);
        assert!(stats.daily_usage.iter().all(|d| d.count == 0));
    }

    #[test]
    fn test_daily_usage_uses_caller_offset() {
        let now = DateTime::parse_from_rfc3339("2024-05-10T02:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        // 23:30 UTC on the 9th is already the 10th at UTC+2.
        let late = session(
            ProvisionPhase::Ready,
            DateTime::parse_from_rfc3339("2024-05-09T23:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        let old = session(ProvisionPhase::Ready, now - Duration::days(30));

        let utc = compute(&[late.clone(), old.clone()], now, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.daily_usage.last().unwrap().date.to_string(), "2024-05-10");
        assert_eq!(utc.daily_usage[5].count, 1);

        let plus2 = compute(&[late, old], now, FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(plus2.daily_usage[6].count, 1);
        assert_eq!(plus2.daily_usage.iter().map(|d| d.count).sum::<u64>(), 1);
        assert_eq!(plus2.daily_usage[0].date.to_string(), "2024-05-04");
    }

    #[test]
    fn test_average_duration() {
        let now = Utc::now();
        let mut a = session(ProvisionPhase::Killed, now);
        a.total_uptime_minutes = 10;
        let mut b = session(ProvisionPhase::Killed, now);
        b.total_uptime_minutes = 5;
        let stats = compute(&[a, b], now, FixedOffset::east_opt(0).unwrap());
        assert_eq!(stats.total_uptime_minutes, 15);
        assert_eq!(stats.avg_session_duration, 7.5);
    }
}

//! Dashboard headline numbers.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use tracing::warn;

use crate::backend::{Backend, Filter};
use crate::config::tables;

/// Counts shown on the dashboard home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_properties: u64,
    pub active_properties: u64,
    pub total_clients: u64,
    pub new_clients_this_month: u64,
    pub recent_events: u64,
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

impl DashboardStats {
    /// Run the five counts concurrently. A failed count shows as zero.
    pub async fn load(backend: &Arc<dyn Backend>, now: DateTime<Utc>) -> Self {
        let month = month_start(now).to_rfc3339();
        let week_ago = (now - Duration::days(7)).to_rfc3339();

        let (total_properties, active_properties, total_clients, new_clients, recent_events) = tokio::join!(
            count_or_zero(backend, tables::PROPERTIES, vec![]),
            count_or_zero(backend, tables::PROPERTIES, vec![Filter::eq("status", "active")]),
            count_or_zero(backend, tables::CLIENTS, vec![]),
            count_or_zero(backend, tables::CLIENTS, vec![Filter::gte("created_at", month)]),
            count_or_zero(backend, tables::EVENTS, vec![Filter::gte("created_at", week_ago)]),
        );

        Self {
            total_properties,
            active_properties,
            total_clients,
            new_clients_this_month: new_clients,
            recent_events,
        }
    }
}

async fn count_or_zero(backend: &Arc<dyn Backend>, table: &str, filters: Vec<Filter>) -> u64 {
    match backend.count(table, &filters).await {
        Ok(n) => n,
        Err(e) => {
            warn!(table, "Error fetching dashboard count: {}", e);
            0
        }
    }
}

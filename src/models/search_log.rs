use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SearchLogEntry {
    pub id: i64,
    pub member_id: Option<i64>,
    pub airport_id: Option<i64>,
    pub search_date: NaiveDate,
    pub search_time: DateTime<Utc>,
    pub desired_start: DateTime<Utc>,
    pub desired_end: DateTime<Utc>,
}

use chrono::{DateTime, Utc};

use crate::db::{queries, Db};
use crate::models::Interval;

/// Appends a search log entry on a detached task. Failures are logged and
/// never reach the caller.
pub fn record_search(
    db: &Db,
    member_id: Option<i64>,
    airport_id: i64,
    interval: Interval,
    searched_at: DateTime<Utc>,
) -> tokio::task::JoinHandle<()> {
    let db = db.clone();
    tokio::spawn(async move {
        let result = db.read(|conn| {
            Ok(queries::insert_search_log(
                conn,
                member_id,
                airport_id,
                &interval,
                &searched_at,
            )?)
        });
        match result {
            Ok(id) => tracing::debug!(search_log_id = id, airport_id, "search logged"),
            Err(e) => tracing::warn!(error = %e, airport_id, "failed to record search"),
        }
    })
}

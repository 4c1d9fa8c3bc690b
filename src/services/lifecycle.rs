use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::db::queries;
use crate::state::AppState;

/// Promotes confirmed bookings whose checkout has passed to completed.
/// Safe to run any number of times; completed bookings never revert.
pub fn run_completion_sweep(conn: &rusqlite::Connection) -> anyhow::Result<usize> {
    queries::complete_elapsed_bookings(conn, &Utc::now().naive_utc())
}

/// Background reconciliation task. Runs the sweep on a fixed period instead
/// of piggybacking on user requests.
pub fn spawn_sweeper(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let result = {
                let db = state.db.lock().unwrap();
                run_completion_sweep(&db)
            };
            match result {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "completed elapsed bookings"),
                Err(e) => tracing::error!(error = %e, "completion sweep failed"),
            }
        }
    });
}

//! Score Reporting
//!
//! Fire-and-forget notifier to the external scoring collaborator. Score
//! deltas are computed here from hit counts; delivery happens on a spawned
//! task so a report can never delay the in-flight game protocol response.
//! Collaborator failures are logged and the update is considered lost --
//! there is no retry queue.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

pub use http::HttpScoreReporter;

// =============================================================================
// SCORING RULES
// =============================================================================

/// Points per successful hit, credited to winner and loser alike.
pub const POINTS_PER_HIT: i64 = 15;

/// Flat bonus for winning, by sinking or by the opponent leaving.
pub const WIN_BONUS: i64 = 150;

/// Flat penalty for forfeiting or disconnecting mid-game.
pub const LEAVER_PENALTY: i64 = -50;

/// Score delta for the winning player: hits plus the win bonus.
pub fn winner_delta(hits: u32) -> i64 {
    i64::from(hits) * POINTS_PER_HIT + WIN_BONUS
}

/// Score delta for a player who lost a completed game: hits only,
/// no penalty.
pub fn loser_delta(hits: u32) -> i64 {
    i64::from(hits) * POINTS_PER_HIT
}

// =============================================================================
// REPORTER CONTRACT
// =============================================================================

/// Failures surfaced by a [`ScoreReporter`]. Always logged, never
/// propagated as a protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Username was empty after trimming; nothing was sent.
    #[error("refusing to report score for empty username")]
    EmptyUsername,

    /// The collaborator was unreachable.
    #[error("score collaborator unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collaborator answered with a non-success status.
    #[error("score collaborator rejected update: HTTP {status}")]
    Rejected {
        /// HTTP status code returned.
        status: u16,
    },
}

/// External scoring collaborator.
///
/// Implementations must validate the username (non-empty) before sending.
/// The delta is signed: penalties arrive negative.
#[async_trait]
pub trait ScoreReporter: Send + Sync {
    /// Apply `delta` to the cumulative score stored for `username`.
    async fn report_score(&self, username: &str, delta: i64) -> Result<(), ScoreError>;
}

/// Dispatch a score update without blocking the caller.
///
/// Spawns the report onto the runtime; the outcome is logged on the spawned
/// task. Game flow continues regardless of delivery.
pub fn dispatch(reporter: &Arc<dyn ScoreReporter>, username: &str, delta: i64) {
    let reporter = Arc::clone(reporter);
    let username = username.to_owned();
    tokio::spawn(async move {
        match reporter.report_score(&username, delta).await {
            Ok(()) => debug!(username = %username, delta, "score reported"),
            Err(e) => warn!(username = %username, delta, error = %e, "score update lost"),
        }
    });
}

// =============================================================================
// TEST SUPPORT
// =============================================================================

/// In-memory reporter used by session and server tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every report instead of delivering it.
    #[derive(Default)]
    pub struct RecordingReporter {
        reports: Mutex<Vec<(String, i64)>>,
    }

    impl RecordingReporter {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn reports(&self) -> Vec<(String, i64)> {
            self.reports.lock().expect("reports lock").clone()
        }
    }

    #[async_trait]
    impl ScoreReporter for RecordingReporter {
        async fn report_score(&self, username: &str, delta: i64) -> Result<(), ScoreError> {
            if username.trim().is_empty() {
                return Err(ScoreError::EmptyUsername);
            }
            self.reports
                .lock()
                .expect("reports lock")
                .push((username.to_owned(), delta));
            Ok(())
        }
    }
}

//! Readiness polling for uploaded files
//!
//! Uploaded videos are processed asynchronously on the server and cannot be
//! referenced from a prompt until they reach `ACTIVE`. [`await_ready`]
//! sleeps and refreshes until that happens or the wait budget runs out.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::gemini::{FileState, MediaService, RemoteAsset};

/// Poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between status checks
    pub interval: Duration,
    /// Give up once this much time has been spent sleeping
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error(
        "Video processing took too long (max {}s). Current state: {last_state}, waited {}s",
        .max_wait.as_secs(),
        .elapsed.as_secs()
    )]
    Timeout {
        last_state: FileState,
        elapsed: Duration,
        max_wait: Duration,
    },
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// The asset in its `ACTIVE` state
    pub asset: RemoteAsset,
    /// Total time spent sleeping
    pub elapsed: Duration,
    /// Number of sleep/refresh rounds
    pub polls: u32,
}

/// Wait until `asset` is `ACTIVE`.
///
/// Elapsed time is counted in whole intervals, not wall-clock time. A
/// failed status refresh is logged and retried on the next round; the
/// round still counts against `max_wait`. Only the timeout ends the loop,
/// so a `FAILED` state is waited out like any other.
pub async fn await_ready<S>(
    service: &S,
    asset: RemoteAsset,
    config: &PollConfig,
) -> Result<PollOutcome, PollError>
where
    S: MediaService + ?Sized,
{
    let mut asset = asset;
    let mut elapsed = Duration::ZERO;
    let mut polls = 0u32;

    while !asset.state.is_active() {
        if elapsed >= config.max_wait {
            return Err(PollError::Timeout {
                last_state: asset.state,
                elapsed,
                max_wait: config.max_wait,
            });
        }

        if !asset.state.is_expected_while_waiting() {
            warn!(state = %asset.state, "Unexpected file state");
        }
        info!(
            state = %asset.state,
            waited_secs = elapsed.as_secs(),
            "Processing..."
        );

        tokio::time::sleep(config.interval).await;
        elapsed += config.interval;
        polls += 1;

        match service.get(&asset.name).await {
            Ok(refreshed) => asset = refreshed,
            Err(e) => warn!(error = %e, "Error checking file state"),
        }
    }

    info!(
        name = %asset.name,
        waited_secs = elapsed.as_secs(),
        "Video processing complete"
    );

    Ok(PollOutcome {
        asset,
        elapsed,
        polls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::testing::{asset, ScriptedService};
    use crate::gemini::GeminiError;

    fn transient() -> GeminiError {
        GeminiError::Api {
            status: 503,
            message: "backend unavailable".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_two_polls() {
        let service = ScriptedService::new(vec![
            Ok(asset(FileState::Processing)),
            Ok(asset(FileState::Active)),
        ]);
        let start = tokio::time::Instant::now();

        let outcome = await_ready(&service, asset(FileState::Processing), &PollConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.polls, 2);
        assert_eq!(outcome.elapsed, Duration::from_secs(10));
        assert_eq!(outcome.asset.state, FileState::Active);
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(service.get_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_active_does_not_sleep() {
        let service = ScriptedService::new(vec![]);

        let outcome = await_ready(&service, asset(FileState::Active), &PollConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.polls, 0);
        assert_eq!(outcome.elapsed, Duration::ZERO);
        assert_eq!(service.get_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_state() {
        // An exhausted script keeps answering PROCESSING
        let service = ScriptedService::new(vec![]).with_fallback(FileState::Processing);

        let err = await_ready(&service, asset(FileState::Processing), &PollConfig::default())
            .await
            .unwrap_err();

        let PollError::Timeout {
            last_state,
            elapsed,
            max_wait,
        } = err;
        assert_eq!(last_state, FileState::Processing);
        assert!(elapsed >= Duration::from_secs(600));
        assert_eq!(max_wait, Duration::from_secs(600));
        assert_eq!(service.get_calls(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_consume_budget() {
        let service = ScriptedService::new(vec![
            Err(transient()),
            Err(transient()),
            Ok(asset(FileState::Active)),
        ]);

        let outcome = await_ready(&service, asset(FileState::Processing), &PollConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.polls, 3);
        assert_eq!(outcome.elapsed, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_is_not_fatal() {
        let service = ScriptedService::new(vec![
            Ok(asset(FileState::Failed)),
            Ok(asset(FileState::Unknown("STATE_UNSPECIFIED".to_string()))),
            Ok(asset(FileState::Active)),
        ]);

        let outcome = await_ready(&service, asset(FileState::Uploading), &PollConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.polls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_budget() {
        let service = ScriptedService::new(vec![]).with_fallback(FileState::Processing);
        let config = PollConfig {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(5),
        };

        let err = await_ready(&service, asset(FileState::Processing), &config)
            .await
            .unwrap_err();
        let PollError::Timeout { elapsed, .. } = err;
        // 2 + 2 + 2: the check happens before each sleep
        assert_eq!(elapsed, Duration::from_secs(6));
    }

    #[test]
    fn test_timeout_message() {
        let err = PollError::Timeout {
            last_state: FileState::Processing,
            elapsed: Duration::from_secs(600),
            max_wait: Duration::from_secs(600),
        };
        let message = err.to_string();
        assert!(message.contains("max 600s"));
        assert!(message.contains("Current state: PROCESSING"));
    }
}

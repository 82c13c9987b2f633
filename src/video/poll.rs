use super::types::JobState;
use crate::backend::{GenAiBackend, VideoOperation};
use crate::config::PollPolicy;
use crate::error::{KhayalError, Result};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// A finished job and the number of status checks it took.
#[derive(Debug)]
pub(crate) struct Finished {
    pub operation: VideoOperation,
    pub attempts: u32,
}

/// Polls `operation` until the service reports it done.
///
/// Waits `policy.interval` before every status check. Stops with
/// `Cancelled` as soon as `cancel` fires, and with `Timeout` once the
/// deadline passes or `policy.max_attempts` checks have been made.
pub(crate) async fn poll_until_done(
    backend: &dyn GenAiBackend,
    mut operation: VideoOperation,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    progress: &mut (dyn FnMut(JobState) + Send),
) -> Result<Finished> {
    let start = Instant::now();
    let deadline = start + policy.timeout;
    let mut attempts = 0;

    while !operation.done {
        if attempts >= policy.max_attempts {
            tracing::warn!(operation = %operation.name, attempts, "giving up on video job");
            return Err(KhayalError::Timeout(start.elapsed()));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(KhayalError::Cancelled),
            _ = sleep(policy.interval) => {}
            _ = sleep_until(deadline) => {
                tracing::warn!(operation = %operation.name, attempts, "video job deadline passed");
                return Err(KhayalError::Timeout(policy.timeout));
            }
        }

        attempts += 1;
        progress(JobState::Polling { attempt: attempts });
        tracing::debug!(operation = %operation.name, attempt = attempts, "checking video job status");

        operation = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(KhayalError::Cancelled),
            result = backend.get_video_operation(&operation) => result?,
        };
    }

    Ok(Finished {
        operation,
        attempts,
    })
}

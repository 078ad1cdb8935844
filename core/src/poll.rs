//! Bounded polling of remote asynchronous jobs.

use crate::{CancellationToken, Error, Result};
use backon::{BackoffBuilder, ConstantBuilder, ExponentialBuilder};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Status reported by a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted but not started.
    Pending,
    /// In progress.
    Running,
    /// Finished; the result is available.
    Succeeded,
    /// Finished without a result.
    Failed,
}

impl JobStatus {
    /// Whether polling can stop at this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Snapshot of a remote job as returned by one poll.
#[derive(Debug, Clone)]
pub struct PollableJob<T> {
    /// Where the job is polled.
    pub location: String,
    /// Current status.
    pub status: JobStatus,
    /// Result payload, present once `status` is `Succeeded`.
    pub result: Option<T>,
    /// Failure detail reported by the remote side, if any.
    pub error: Option<String>,
}

impl<T> PollableJob<T> {
    /// A job that has not finished yet.
    pub fn in_progress(location: impl Into<String>, status: JobStatus) -> Self {
        Self {
            location: location.into(),
            status,
            result: None,
            error: None,
        }
    }

    /// A job that finished with `result`.
    pub fn succeeded(location: impl Into<String>, result: T) -> Self {
        Self {
            location: location.into(),
            status: JobStatus::Succeeded,
            result: Some(result),
            error: None,
        }
    }

    /// A job that finished with a failure.
    pub fn failed(location: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: JobStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// How long to wait between polls and when to give up.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay before the first poll, and the fixed delay when backoff is off.
    pub interval: Duration,
    /// Upper bound for any single delay.
    pub max_interval: Duration,
    /// Total time allowed from submission until a terminal status.
    pub timeout: Duration,
    /// Grow delays exponentially (factor 2) up to `max_interval`.
    pub exponential: bool,
    /// Add random jitter to each delay.
    pub jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            exponential: true,
            jitter: true,
        }
    }
}

impl PollPolicy {
    /// Poll every `interval` until `timeout`.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            timeout,
            exponential: false,
            jitter: false,
        }
    }

    /// Poll with capped exponential backoff and jitter.
    pub fn exponential(interval: Duration, max_interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            max_interval: max_interval.max(interval),
            timeout,
            exponential: true,
            jitter: true,
        }
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        if self.exponential {
            let mut builder = ExponentialBuilder::default()
                .with_min_delay(self.interval)
                .with_max_delay(self.max_interval)
                .with_factor(2.0)
                .with_max_times(usize::MAX);
            if self.jitter {
                builder = builder.with_jitter();
            }
            Box::new(builder.build())
        } else {
            let mut builder = ConstantBuilder::default()
                .with_delay(self.interval)
                .with_max_times(usize::MAX);
            if self.jitter {
                builder = builder.with_jitter();
            }
            Box::new(builder.build())
        }
    }
}

/// JobPoller drives a submitted job to a terminal status.
///
/// The loop sleeps before every poll, so the first poll happens one
/// `interval` after submission. Poll errors marked retryable are logged and
/// polled again; any other poll error aborts the wait. The poll operation must
/// be free of side effects so repeating it is safe.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    policy: PollPolicy,
    cancel: Option<CancellationToken>,
}

impl JobPoller {
    /// Create a poller with `policy`.
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    /// Abandon the wait with a `Cancelled` error once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get the policy.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Submit a job and wait for its result.
    ///
    /// - `submit` starts the job and returns a handle to poll it by.
    /// - `poll` reports the job's current state for a handle.
    ///
    /// Fails with `JobTimeout` if no terminal status is seen within the
    /// policy timeout, `JobFailed` if the job reports failure, and
    /// `Cancelled` if the cancellation token fires. The deadline and the
    /// token also bound the submit and poll calls themselves.
    pub async fn submit_and_wait<H, T, S, SF, P, PF>(&self, submit: S, mut poll: P) -> Result<T>
    where
        H: Clone + std::fmt::Debug,
        S: FnOnce() -> SF,
        SF: Future<Output = Result<H>>,
        P: FnMut(H) -> PF,
        PF: Future<Output = Result<PollableJob<T>>>,
    {
        let started = Instant::now();
        let deadline = started + self.policy.timeout;
        let mut attempts = 0usize;

        let handle = self.bounded(submit(), deadline, attempts, started).await?;
        let mut delays = self.policy.delays();

        debug!("job submitted: {handle:?}");

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(self.timeout_error(attempts, started));
            }

            let delay = delays
                .next()
                .unwrap_or(self.policy.max_interval)
                .min(deadline - now);
            self.sleep(delay).await?;

            attempts += 1;
            match self
                .bounded(poll(handle.clone()), deadline, attempts, started)
                .await
            {
                Ok(job) => match job.status {
                    JobStatus::Succeeded => {
                        debug!("job {} succeeded after {attempts} polls", job.location);
                        return job.result.ok_or_else(|| {
                            Error::job_failed("job succeeded without a result")
                                .with_context(format!("location: {}", job.location))
                        });
                    }
                    JobStatus::Failed => {
                        return Err(Error::job_failed(
                            job.error
                                .unwrap_or_else(|| "remote job reported failure".to_string()),
                        )
                        .with_context(format!("location: {}", job.location))
                        .with_context(format!("attempts: {attempts}")));
                    }
                    JobStatus::Pending | JobStatus::Running => {
                        debug!("job {} is {:?}, attempt {attempts}", job.location, job.status);
                    }
                },
                Err(err) if err.is_retryable() => {
                    warn!("poll attempt {attempts} failed, will retry: {err}");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn sleep(&self, delay: Duration) -> Result<()> {
        let Some(token) = &self.cancel else {
            tokio::time::sleep(delay).await;
            return Ok(());
        };

        if token.is_cancelled() {
            return Err(Error::cancelled("job wait cancelled"));
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = token.cancelled() => Err(Error::cancelled("job wait cancelled")),
        }
    }

    /// Run `fut` until it completes, the deadline passes or the token fires.
    async fn bounded<F, O>(
        &self,
        fut: F,
        deadline: Instant,
        attempts: usize,
        started: Instant,
    ) -> Result<O>
    where
        F: Future<Output = Result<O>>,
    {
        let timed = tokio::time::timeout_at(deadline, fut);
        let out = match &self.cancel {
            None => timed.await,
            Some(token) => {
                if token.is_cancelled() {
                    return Err(Error::cancelled("job wait cancelled"));
                }
                tokio::select! {
                    out = timed => out,
                    _ = token.cancelled() => return Err(Error::cancelled("job wait cancelled")),
                }
            }
        };

        match out {
            Ok(res) => res,
            Err(_) => Err(self.timeout_error(attempts, started)),
        }
    }

    fn timeout_error(&self, attempts: usize, started: Instant) -> Error {
        Error::job_timeout(format!(
            "job did not finish within {:?}",
            self.policy.timeout
        ))
        .with_context(format!("attempts: {attempts}"))
        .with_context(format!("elapsed: {:?}", started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fixed_poller() -> JobPoller {
        JobPoller::new(PollPolicy::fixed(
            Duration::from_secs(5),
            Duration::from_secs(30),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_always_running() {
        let polls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let err = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |loc| {
                    let polls = polls.clone();
                    async move {
                        polls.fetch_add(1, Ordering::SeqCst);
                        Ok(PollableJob::<String>::in_progress(loc, JobStatus::Running))
                    }
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::JobTimeout);
        assert_eq!(polls.load(Ordering::SeqCst), 6);
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_result_without_further_polls() {
        let polls = Arc::new(AtomicUsize::new(0));

        let result = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |loc| {
                    let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n < 3 {
                            Ok(PollableJob::in_progress(loc, JobStatus::Pending))
                        } else {
                            Ok(PollableJob::succeeded(loc, "text".to_string()))
                        }
                    }
                },
            )
            .await
            .unwrap();

        assert_eq!(result, "text");
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_is_job_failed() {
        let err = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |loc| async move { Ok(PollableJob::<String>::failed(loc, "InvalidContent")) },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::JobFailed);
        assert_eq!(err.message(), "InvalidContent");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_poll_error_is_retried() {
        let polls = Arc::new(AtomicUsize::new(0));

        let result = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |loc| {
                    let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n == 1 {
                            Err(Error::unexpected("connection reset").set_retryable(true))
                        } else {
                            Ok(PollableJob::succeeded(loc, 42))
                        }
                    }
                },
            )
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_poll_error_aborts() {
        let err = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |_| async { Err::<PollableJob<()>, _>(Error::request_invalid("bad location")) },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_error_is_returned() {
        let err = fixed_poller()
            .submit_and_wait(
                || async { Err::<String, _>(Error::unexpected("submit rejected")) },
                |_| async { Ok(PollableJob::<()>::in_progress("loc", JobStatus::Running)) },
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "submit rejected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_waiting() {
        let token = CancellationToken::new();
        let poller = fixed_poller().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            token.cancel();
        });

        let err = poller
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |loc| async move { Ok(PollableJob::<()>::in_progress(loc, JobStatus::Running)) },
            )
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_poll_is_bounded_by_timeout() {
        let started = Instant::now();

        let err = fixed_poller()
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |_| std::future::pending::<Result<PollableJob<()>>>(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::JobTimeout);
        assert!(err.context().contains(&"attempts: 1".to_string()));
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_submit_is_bounded_by_timeout() {
        let polls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let err = fixed_poller()
            .submit_and_wait(
                std::future::pending::<Result<String>>,
                |loc| {
                    polls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(PollableJob::<()>::in_progress(loc, JobStatus::Running)) }
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::JobTimeout);
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert!(started.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_stalled_poll() {
        let token = CancellationToken::new();
        let poller = fixed_poller().with_cancellation(token.clone());
        let started = Instant::now();

        // The first poll starts at 5s and never returns.
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            token.cancel();
        });

        let err = poller
            .submit_and_wait(
                || async { Ok("loc".to_string()) },
                |_| std::future::pending::<Result<PollableJob<()>>>(),
            )
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(8));
    }

    #[test]
    fn test_exponential_delays_are_capped() {
        let policy = PollPolicy::exponential(
            Duration::from_secs(1),
            Duration::from_secs(8),
            Duration::from_secs(60),
        )
        .with_jitter(false);

        let delays: Vec<_> = policy.delays().take(6).collect();
        assert_eq!(
            delays,
            [1, 2, 4, 8, 8, 8].map(Duration::from_secs).to_vec()
        );
    }

    #[test]
    fn test_fixed_delays() {
        let policy = PollPolicy::fixed(Duration::from_secs(5), Duration::from_secs(60));
        let delays: Vec<_> = policy.delays().take(3).collect();
        assert_eq!(delays, vec![Duration::from_secs(5); 3]);
    }
}

//! Poll-until-ready protocol for server-side PDF generation.
//!
//! Every report family exposes the same three calls: submit a render job,
//! check its status, download the finished file. The submit call either
//! accepts the job or rejects it with a server message; after that the
//! status endpoint is polled on a fixed interval until the job completes
//! or the attempt budget runs out.
//!
//! The state transition is a pure function so the protocol can be tested
//! without timers; the sleeping happens in [`run_poll`] behind the
//! [`Sleeper`] seam.

use std::path::PathBuf;

use crate::error::{AcctError, Result};

/// Status checks per job before giving up.
pub const MAX_POLL_ATTEMPTS: u32 = 20;

/// Base wait between status checks.
pub const POLL_INTERVAL_MS: u64 = 3000;

/// A render job handle returned by a submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfJob {
    pub job_id: String,
    pub file_name: String,
}

/// What the submit call produced.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Accepted(PdfJob),
    /// The server refused the job; its message goes to the user verbatim
    /// and there is no retry.
    Rejected(String),
}

/// Result of one status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The file is ready to download.
    Completed,
    /// Still rendering.
    Pending,
    /// The status endpoint answered HTTP 500. The next wait is doubled to
    /// give a struggling server room. Only the status check gets this
    /// treatment, not the submit call.
    SlowServer,
    /// Any other transient failure; retried at the normal interval.
    TransientError,
}

/// Where a job currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting `wait_ms` before status check number `attempt`.
    Polling { attempt: u32, wait_ms: u64 },
    Ready,
    Failed { attempts: u32 },
}

impl JobState {
    pub fn submitted() -> Self {
        JobState::Polling {
            attempt: 1,
            wait_ms: POLL_INTERVAL_MS,
        }
    }
}

/// Fold one status check into the job state. Terminal states are absorbing.
pub fn step(state: JobState, outcome: CheckOutcome) -> JobState {
    let JobState::Polling { attempt, .. } = state else {
        return state;
    };
    match outcome {
        CheckOutcome::Completed => JobState::Ready,
        _ if attempt >= MAX_POLL_ATTEMPTS => JobState::Failed { attempts: attempt },
        CheckOutcome::SlowServer => JobState::Polling {
            attempt: attempt + 1,
            wait_ms: POLL_INTERVAL_MS * 2,
        },
        CheckOutcome::Pending | CheckOutcome::TransientError => JobState::Polling {
            attempt: attempt + 1,
            wait_ms: POLL_INTERVAL_MS,
        },
    }
}

/// How the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    Ready,
    TimedOut { attempts: u32 },
}

pub trait Sleeper {
    fn sleep(&self, ms: u64);
}

/// Production sleeper: blocks the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Drive a submitted job until it is ready or the attempt budget is spent.
/// Strictly sequential: one status check at a time.
pub fn run_poll<S: Sleeper>(sleeper: &S, mut check: impl FnMut() -> CheckOutcome) -> PollResult {
    let mut state = JobState::submitted();
    loop {
        match state {
            JobState::Polling { wait_ms, .. } => {
                sleeper.sleep(wait_ms);
                state = step(state, check());
            }
            JobState::Ready => return PollResult::Ready,
            JobState::Failed { attempts } => return PollResult::TimedOut { attempts },
        }
    }
}

/// The full submit -> poll -> download pipeline, parameterized by the three
/// per-family endpoint calls.
pub fn generate_pdf<S, Sub, Chk, Dl>(
    sleeper: &S,
    submit: Sub,
    mut check: Chk,
    download: Dl,
) -> Result<PathBuf>
where
    S: Sleeper,
    Sub: FnOnce() -> Result<SubmitOutcome>,
    Chk: FnMut(&PdfJob) -> CheckOutcome,
    Dl: FnOnce(&PdfJob) -> Result<PathBuf>,
{
    let job = match submit()? {
        SubmitOutcome::Accepted(job) => job,
        SubmitOutcome::Rejected(message) => return Err(AcctError::PdfJobRejected(message)),
    };

    match run_poll(sleeper, || check(&job)) {
        PollResult::Ready => download(&job),
        PollResult::TimedOut { attempts } => Err(AcctError::PdfJobTimeout { attempts }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSleeper {
        waits: Mutex<Vec<u64>>,
    }

    impl RecordingSleeper {
        fn new() -> Self {
            Self {
                waits: Mutex::new(Vec::new()),
            }
        }

        fn waits(&self) -> Vec<u64> {
            self.waits.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, ms: u64) {
            self.waits.lock().unwrap().push(ms);
        }
    }

    fn job() -> PdfJob {
        PdfJob {
            job_id: "job-1".to_string(),
            file_name: "report.pdf".to_string(),
        }
    }

    #[test]
    fn completes_on_sixth_attempt_with_nominal_waits() {
        let sleeper = RecordingSleeper::new();
        let mut attempt = 0;
        let result = run_poll(&sleeper, || {
            attempt += 1;
            if attempt == 6 {
                CheckOutcome::Completed
            } else {
                CheckOutcome::Pending
            }
        });

        assert_eq!(result, PollResult::Ready);
        assert_eq!(sleeper.waits(), vec![3000; 6]);
    }

    #[test]
    fn slow_server_doubles_only_the_next_wait() {
        let sleeper = RecordingSleeper::new();
        let mut attempt = 0;
        let result = run_poll(&sleeper, || {
            attempt += 1;
            match attempt {
                1 => CheckOutcome::SlowServer,
                2 => CheckOutcome::Pending,
                _ => CheckOutcome::Completed,
            }
        });

        assert_eq!(result, PollResult::Ready);
        assert_eq!(sleeper.waits(), vec![3000, 6000, 3000]);
    }

    #[test]
    fn gives_up_after_the_attempt_budget() {
        let sleeper = RecordingSleeper::new();
        let result = run_poll(&sleeper, || CheckOutcome::Pending);

        assert_eq!(
            result,
            PollResult::TimedOut {
                attempts: MAX_POLL_ATTEMPTS
            }
        );
        assert_eq!(sleeper.waits().len(), MAX_POLL_ATTEMPTS as usize);
    }

    #[test]
    fn transient_errors_keep_the_normal_interval() {
        let next = step(
            JobState::Polling {
                attempt: 3,
                wait_ms: 6000,
            },
            CheckOutcome::TransientError,
        );
        assert_eq!(
            next,
            JobState::Polling {
                attempt: 4,
                wait_ms: POLL_INTERVAL_MS
            }
        );
    }

    #[test]
    fn terminal_states_absorb_further_checks() {
        assert_eq!(step(JobState::Ready, CheckOutcome::Pending), JobState::Ready);
        let failed = JobState::Failed { attempts: 20 };
        assert_eq!(step(failed, CheckOutcome::Completed), failed);
    }

    #[test]
    fn rejected_submit_surfaces_the_server_message_without_polling() {
        let sleeper = RecordingSleeper::new();
        let result = generate_pdf(
            &sleeper,
            || Ok(SubmitOutcome::Rejected("period is closed".to_string())),
            |_| CheckOutcome::Completed,
            |_| Ok(PathBuf::from("unused.pdf")),
        );

        match result {
            Err(AcctError::PdfJobRejected(message)) => assert_eq!(message, "period is closed"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn timeout_never_downloads() {
        let sleeper = RecordingSleeper::new();
        let mut downloads = 0;
        let result = generate_pdf(
            &sleeper,
            || Ok(SubmitOutcome::Accepted(job())),
            |_| CheckOutcome::Pending,
            |_| {
                downloads += 1;
                Ok(PathBuf::from("unused.pdf"))
            },
        );

        match result {
            Err(AcctError::PdfJobTimeout { attempts }) => assert_eq!(attempts, MAX_POLL_ATTEMPTS),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(downloads, 0);
    }

    #[test]
    fn ready_downloads_exactly_once() {
        let sleeper = RecordingSleeper::new();
        let mut downloads = 0;
        let result = generate_pdf(
            &sleeper,
            || Ok(SubmitOutcome::Accepted(job())),
            |_| CheckOutcome::Completed,
            |j| {
                downloads += 1;
                Ok(PathBuf::from(&j.file_name))
            },
        );

        assert_eq!(result.unwrap(), PathBuf::from("report.pdf"));
        assert_eq!(downloads, 1);
    }
}

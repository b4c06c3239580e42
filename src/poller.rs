// Submission poller: uploads one file per slot, then re-reads the problem
// page until grading finishes or the session expires.

use crate::api::Transport;
use crate::error::{AtheneError, Result};
use crate::response::{AtheneResponse, SubmitResults, UploadSlot};
use crate::session::refresh;
use crate::settings::Settings;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Submitted,
    Polling,
    Timeout,
    Done,
}

/// How waiting for the grader ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Done {
        results: SubmitResults,
        elapsed: Duration,
    },
    /// The session expired mid-wait; status has to be checked later.
    Timeout { elapsed: Duration },
}

/// Receives the elapsed wait time on every display tick.
pub trait Progress {
    fn tick(&mut self, elapsed: Duration);
    fn finish(&mut self) {}
}

impl<F: FnMut(Duration)> Progress for F {
    fn tick(&mut self, elapsed: Duration) {
        self(elapsed)
    }
}

pub struct SubmissionPoller<'a, T: Transport + ?Sized> {
    transport: &'a T,
    assignment_url: &'a str,
    poll_interval: Duration,
    tick: Duration,
    state: PollState,
}

impl<'a, T: Transport + ?Sized> SubmissionPoller<'a, T> {
    pub fn new(transport: &'a T, assignment_url: &'a str, settings: &Settings) -> Self {
        Self {
            transport,
            assignment_url,
            poll_interval: settings.poll_interval,
            tick: settings.tick,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    fn require(&self, expected: PollState) -> Result<()> {
        if self.state != expected {
            return Err(AtheneError::PollOrder {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: PollState) {
        debug!(from = ?self.state, to = ?next, "poller transition");
        self.state = next;
    }

    /// Upload `files` to the slots the page declared, slot N getting file N.
    /// A count mismatch fails before anything is sent. Only valid once, from
    /// `Idle`.
    pub fn submit(&mut self, slots: &[UploadSlot], files: &[PathBuf]) -> Result<()> {
        self.require(PollState::Idle)?;
        if slots.len() != files.len() {
            return Err(AtheneError::SlotCountMismatch {
                expected: slots.len(),
                provided: files.len(),
                slot_names: slots.iter().map(|slot| slot.name.clone()).collect(),
            });
        }

        let pairs: Vec<(UploadSlot, PathBuf)> = slots
            .iter()
            .cloned()
            .zip(files.iter().cloned())
            .collect();
        self.transport.submit(self.assignment_url, &pairs)?;

        info!(files = pairs.len(), "submitted files");
        self.transition(PollState::Submitted);
        Ok(())
    }

    /// Block until the grader produces results or the session times out.
    ///
    /// The page is requested at most once per poll interval; `progress` is
    /// ticked at the faster display cadence. There is no overall deadline.
    pub fn wait<P: Progress + ?Sized>(&mut self, progress: &mut P) -> Result<PollOutcome> {
        self.require(PollState::Submitted)?;
        self.transition(PollState::Polling);

        let start = Instant::now();
        let mut last_poll = start;

        loop {
            progress.tick(start.elapsed());
            thread::sleep(self.tick);

            if last_poll.elapsed() < self.poll_interval {
                continue;
            }
            last_poll = Instant::now();

            let page = match refresh(self.transport, self.assignment_url) {
                Ok(page) => page,
                Err(err) => {
                    progress.finish();
                    return Err(err);
                }
            };

            match page {
                AtheneResponse::Pending => continue,
                AtheneResponse::SessionTimedOut => {
                    progress.finish();
                    self.transition(PollState::Timeout);
                    return Ok(PollOutcome::Timeout {
                        elapsed: start.elapsed(),
                    });
                }
                AtheneResponse::Ready {
                    results: Some(results),
                    ..
                } => {
                    progress.finish();
                    self.transition(PollState::Done);
                    return Ok(PollOutcome::Done {
                        results,
                        elapsed: start.elapsed(),
                    });
                }
                AtheneResponse::Ready { results: None, .. } => {
                    progress.finish();
                    return Err(AtheneError::InconsistentServerState);
                }
            }
        }
    }
}

/// `42s` under a minute, `3m 5s` otherwise.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

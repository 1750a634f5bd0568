//! Driving a FileWalker: on a dedicated thread or on the caller's.
//!
//! `TickRunner` owns the walker for as long as the thread lives. The
//! controller talks to it through the walker's `StopHandle` and receives
//! every non-idle `TickStatus` over a bounded channel.
//!
//! Safety: each `TickRunner` spawns exactly one thread, which is shut down and
//! joined when the runner is stopped or dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use walker_traits::ByteLink;

use crate::status::TickStatus;
use crate::stop::StopHandle;
use crate::walker::FileWalker;

/// Capacity of the status channel; the oldest status is dropped beyond it.
const EVENT_CAPACITY: usize = 64;

pub struct TickRunner<L: ByteLink + Send + 'static> {
    events: xch::Receiver<TickStatus>,
    stop: StopHandle,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<FileWalker<L>>>,
}

impl<L: ByteLink + Send + 'static> TickRunner<L> {
    /// Move `walker` onto a new thread that ticks it until shut down,
    /// sleeping `idle_poll` whenever no Step was due.
    pub fn spawn(mut walker: FileWalker<L>, idle_poll: Duration) -> Self {
        let (tx, events) = xch::bounded(EVENT_CAPACITY);
        let overflow = events.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let stop = walker.stop_handle();
        let clock = walker.clock();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("tick thread received shutdown signal");
                    break;
                }
                match walker.do_tick() {
                    TickStatus::Idle | TickStatus::Waiting => clock.sleep(idle_poll),
                    status => {
                        // Full: drop the oldest status, keep the newest.
                        if let Err(xch::TrySendError::Full(s)) = tx.try_send(status) {
                            let _ = overflow.try_recv();
                            let _ = tx.try_send(s);
                        }
                    }
                }
            }
            tracing::trace!("tick thread exiting cleanly");
            walker
        });

        Self {
            events,
            stop,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Stop flags of the walker running on the thread.
    pub fn stop_handle(&self) -> &StopHandle {
        &self.stop
    }

    /// Statuses produced since the last call.
    pub fn drain(&self) -> Vec<TickStatus> {
        self.events.try_iter().collect()
    }

    /// Wait up to `timeout` for the next status.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TickStatus> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Shut the thread down and take the walker back. `None` if the thread
    /// panicked.
    pub fn stop(mut self) -> Option<FileWalker<L>> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(walker) => Some(walker),
            Err(e) => {
                tracing::warn!(?e, "tick thread panicked");
                None
            }
        }
    }
}

impl<L: ByteLink + Send + 'static> Drop for TickRunner<L> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => tracing::trace!("tick thread joined successfully"),
                Err(e) => tracing::warn!(?e, "tick thread panicked during shutdown"),
            }
        }
    }
}

/// Outcome of [`run_until_end_of_cycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps that fired, including faulted ones.
    pub steps: u64,
    /// Steps whose transmission was abandoned.
    pub faults: u64,
    /// A stop was requested through `shutdown` or the step limit.
    pub stop_requested: bool,
}

/// Tick `walker` on the calling thread until its selection ends.
///
/// Setting `shutdown`, or reaching `max_steps`, requests a graceful stop; the
/// function still returns only once the walker acknowledges it. Returns
/// immediately if nothing is selected.
pub fn run_until_end_of_cycle<L: ByteLink>(
    walker: &mut FileWalker<L>,
    shutdown: &AtomicBool,
    max_steps: Option<u64>,
    idle_poll: Duration,
) -> RunSummary {
    let clock = walker.clock();
    let mut summary = RunSummary::default();
    loop {
        let limit_hit = max_steps.is_some_and(|n| summary.steps >= n);
        if !summary.stop_requested && (limit_hit || shutdown.load(Ordering::Relaxed)) {
            summary.stop_requested = walker.select_program(None);
        }
        match walker.do_tick() {
            TickStatus::Idle | TickStatus::EndOfCycle => break,
            TickStatus::Waiting => clock.sleep(idle_poll),
            TickStatus::Stepped => summary.steps += 1,
            TickStatus::Faulted(e) => {
                tracing::warn!(error = %e, "step faulted");
                summary.steps += 1;
                summary.faults += 1;
            }
        }
    }
    tracing::debug!(?summary, "cycle finished");
    summary
}

//! Attack context and send accounting

use crate::connection::Connection;
use crate::{ModuleParams, Result, Target};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Send statistics for one module invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    /// Send calls issued
    pub attempted: u64,
    /// Sends that returned a positive byte count
    pub sent: u64,
    /// Sends that errored or moved zero bytes
    pub failed: u64,
    /// Bytes accepted by the connection
    pub bytes_sent: u64,
}

impl SendStats {
    fn record(&mut self, outcome: &Result<usize>) -> bool {
        self.attempted += 1;
        match outcome {
            Ok(n) if *n > 0 => {
                self.sent += 1;
                self.bytes_sent += *n as u64;
                true
            }
            _ => {
                self.failed += 1;
                false
            }
        }
    }
}

/// What is left of a context once the module has finished
#[derive(Debug, Clone)]
pub struct ContextOutput {
    pub logs: Vec<String>,
    pub stats: SendStats,
    pub elapsed: Duration,
}

/// Context handed to a module for one invocation
///
/// Owns the ordered log of the run and the send counters. The optional
/// deadline is a soft limit: modules consult it between tests and inside
/// their loops, nothing is interrupted mid-call.
pub struct AttackContext<'a> {
    conn: &'a mut dyn Connection,
    target: &'a Target,
    params: &'a ModuleParams,
    module_id: &'static str,
    started: Instant,
    deadline: Option<Instant>,
    logs: Vec<String>,
    stats: SendStats,
}

impl<'a> AttackContext<'a> {
    /// Create a context. A zero `timeout` means no overall deadline.
    pub fn new(
        conn: &'a mut dyn Connection,
        target: &'a Target,
        params: &'a ModuleParams,
        module_id: &'static str,
        timeout: Duration,
    ) -> Self {
        let started = Instant::now();
        let deadline = if timeout.is_zero() {
            None
        } else {
            Some(started + timeout)
        };

        Self {
            conn,
            target,
            params,
            module_id,
            started,
            deadline,
            logs: Vec::new(),
            stats: SendStats::default(),
        }
    }

    /// Append a line to the run log
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(module = self.module_id, "{}", line.trim_start());
        self.logs.push(line);
    }

    /// Send one frame; true only when the connection reported a positive byte count
    pub fn send(&mut self, frame: &[u8], timeout: Duration) -> bool {
        let outcome = self.conn.send(frame, timeout);
        if let Err(e) = &outcome {
            debug!(module = self.module_id, error = %e, len = frame.len(), "Send failed");
        }
        self.stats.record(&outcome)
    }

    /// Direct access to the connection (capture uses it for receives)
    pub fn connection(&mut self) -> &mut dyn Connection {
        &mut *self.conn
    }

    pub fn target(&self) -> &Target {
        self.target
    }

    pub fn params(&self) -> &ModuleParams {
        self.params
    }

    pub fn module_id(&self) -> &'static str {
        self.module_id
    }

    pub fn stats(&self) -> SendStats {
        self.stats
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the overall deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Deadline for a sub-test with its own `budget`, capped by the overall deadline
    pub fn deadline_for(&self, budget: Duration) -> Instant {
        let own = Instant::now() + budget;
        match self.deadline {
            Some(d) if d < own => d,
            _ => own,
        }
    }

    /// Sleep for `pause`, never past the overall deadline
    pub fn pause(&self, pause: Duration) {
        let pause = match self.deadline {
            Some(d) => pause.min(d.saturating_duration_since(Instant::now())),
            None => pause,
        };
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    /// Consume the context
    pub fn finish(self) -> ContextOutput {
        ContextOutput {
            logs: self.logs,
            stats: self.stats,
            elapsed: self.started.elapsed(),
        }
    }
}

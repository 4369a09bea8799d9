//! Structured scheduling events and the sink they flow into.
//!
//! The kernel never formats output files; it reports what happened through a
//! [`TraceSink`], and the embedding binary decides how to render it. Events
//! carry the core they concern, so a sink can keep one chronological log per
//! core.

use crate::decision::DecisionKind;

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Start of a decision: the kind actually handled, its time, and the
    /// system criticality level before the transition.
    Decision { kind: DecisionKind, time: f64, crit_level: usize },
    /// A job released into the ready queue. `over_budget` marks an actual
    /// execution time above the WCET of the current system level.
    JobArrived { task: usize, job: usize, exec_time: f64, over_budget: bool },
    /// Snapshot of the job occupying the core after the transition.
    Scheduled {
        task: usize,
        job: usize,
        exec_time: f64,
        rem_exec_time: f64,
        wcet_counter: f64,
        deadline: f64,
    },
    Preempted { task: usize, job: usize },
    Completed { task: usize, job: usize },
    DeadlineMiss { task: usize, job: usize, deadline: f64 },
    /// The system criticality level rose.
    CritChanged { level: usize },
    /// A job left the ready queue for the discarded pool.
    Demoted { task: usize, job: usize, rem_exec_time: f64 },
    /// A discarded job's deadline passed; it was dropped.
    DiscardExpired { task: usize, job: usize, deadline: f64 },
    /// A discarded job was promoted into the decision core's ready queue.
    Reclaimed { task: usize, job: usize, slack: f64 },
    /// Nothing to run after the transition.
    Idle,
    /// A shut-down core woke up.
    Wakeup,
    /// End of one decision's transition block.
    EndOfDecision,
}

pub trait TraceSink {
    fn record(&mut self, core_no: usize, event: TraceEvent);
}

/// Discards everything; for tests that only assert on simulator state.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _core_no: usize, _event: TraceEvent) {}
}

/// Buffers everything; for tests that assert on the event stream.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<(usize, TraceEvent)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_kind<'a>(
        &'a self,
        matches: impl Fn(&TraceEvent) -> bool + 'a,
    ) -> impl Iterator<Item = &'a (usize, TraceEvent)> {
        self.events.iter().filter(move |(_, e)| matches(e))
    }
}

impl TraceSink for MemorySink {
    fn record(&mut self, core_no: usize, event: TraceEvent) {
        self.events.push((core_no, event));
    }
}

//! Decision-point engine: where does simulated time go next?
//!
//! Each core contributes up to four candidate times; the globally earliest
//! one becomes the next decision. Within a core, candidates at the same time
//! rank COMPLETION > TIMER_EXPIRE > CRIT_CHANGE > ARRIVAL; across cores a
//! strictly earlier time wins, so ties go to the lower core index.

use crate::config::MAX_CRIT_LEVELS;
use crate::platform::{CoreState, Processor};
use crate::task::TaskSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Arrival,
    Completion,
    TimerExpire,
    CritChange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPoint {
    pub core_no: usize,
    pub time: f64,
    pub kind: DecisionKind,
}

/// Earliest next release among the tasks pinned to `core_no`.
pub fn find_earliest_arrival(tasks: &TaskSet, core_no: usize) -> f64 {
    tasks
        .iter()
        .filter(|t| t.core == core_no)
        .map(|t| t.next_release())
        .fold(f64::INFINITY, f64::min)
}

/// The globally next decision, or `None` when no core can make progress
/// (every core faulted, or shut down with no wake-up pending).
pub fn find_decision_point(tasks: &TaskSet, processor: &Processor) -> Option<DecisionPoint> {
    let mut decision: Option<DecisionPoint> = None;

    for (core_no, core) in processor.cores.iter().enumerate() {
        let mut arrival_time = f64::INFINITY;
        let mut expiry_time = f64::INFINITY;
        let mut completion_time = f64::INFINITY;
        let mut wcet_counter = f64::INFINITY;

        match core.state {
            CoreState::Active => arrival_time = find_earliest_arrival(tasks, core_no),
            CoreState::Shutdown => expiry_time = core.next_invocation_time,
            CoreState::Faulted => continue,
        }

        if let Some(job) = &core.curr_exec_job {
            completion_time = job.completion_time;
            if processor.crit_level < MAX_CRIT_LEVELS - 1 {
                wcet_counter = core.wcet_counter;
            }
        }

        let min_time = arrival_time.min(expiry_time).min(completion_time).min(wcet_counter);
        if min_time.is_infinite() {
            continue;
        }

        if decision.map_or(true, |d| min_time < d.time) {
            let kind = if min_time == completion_time {
                DecisionKind::Completion
            } else if min_time == expiry_time {
                DecisionKind::TimerExpire
            } else if min_time == wcet_counter {
                DecisionKind::CritChange
            } else {
                DecisionKind::Arrival
            };
            decision = Some(DecisionPoint { core_no, time: min_time, kind });
        }
    }

    decision
}

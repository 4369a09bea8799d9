//! The simulated platform: cores and the processor they form.

use crate::config::{FREQUENCY_TABLE, MAX_CRIT_LEVELS};
use crate::job::Job;
use crate::queue::{DiscardedQueue, ReadyQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Active,
    Shutdown,
    /// Terminal: a job on this core missed its deadline. The core stops
    /// producing decision points; the rest of the platform keeps running.
    Faulted,
}

/// Per-core setup parameters: the EDF-VD factor and threshold, either supplied
/// by the platform configuration file or derived by the analyzer. An
/// `x_factor` of zero declares the core unschedulable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreParams {
    pub x_factor: f64,
    pub threshold_crit_lvl: usize,
}

#[derive(Debug, Clone)]
pub struct Core {
    pub ready_queue: ReadyQueue,
    pub curr_exec_job: Option<Job>,
    /// Simulated clock of this core: the last decision time applied to it.
    pub total_time: f64,
    pub total_idle_time: f64,
    /// Absolute clock at which the running job would cross its budget.
    pub wcet_counter: f64,
    /// Wake-up time while shut down.
    pub next_invocation_time: f64,
    pub frequency: f64,
    pub state: CoreState,
    pub x_factor: f64,
    pub threshold_crit_lvl: usize,
}

impl Core {
    pub fn new() -> Self {
        Self {
            ready_queue: ReadyQueue::new(),
            curr_exec_job: None,
            total_time: 0.0,
            total_idle_time: 0.0,
            wcet_counter: f64::INFINITY,
            next_invocation_time: f64::INFINITY,
            frequency: FREQUENCY_TABLE[FREQUENCY_TABLE.len() - 1],
            state: CoreState::Active,
            x_factor: 0.0,
            threshold_crit_lvl: MAX_CRIT_LEVELS - 1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.curr_exec_job.is_some()
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Processor {
    pub cores: Vec<Core>,
    /// Global system criticality level, nondecreasing over a run.
    pub crit_level: usize,
    /// The processor-wide pool of demoted jobs awaiting slack.
    pub discarded_queue: DiscardedQueue,
}

impl Processor {
    pub fn new(total_cores: usize) -> Self {
        Self {
            cores: (0..total_cores).map(|_| Core::new()).collect(),
            crit_level: 0,
            discarded_queue: DiscardedQueue::new(),
        }
    }

    pub fn total_cores(&self) -> usize {
        self.cores.len()
    }
}

//! Per-core run statistics, accumulated by the driver.

use serde::Serialize;

/// Counters for one core. All monotonically nondecreasing; energy is charged
/// one unit per simulated time unit in the respective state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoreStats {
    pub active_energy: f64,
    pub idle_energy: f64,
    pub shutdown_time: f64,
    pub context_switches: u64,
    pub arrival_points: u64,
    pub completion_points: u64,
    pub criticality_change_points: u64,
    pub wakeup_points: u64,
    /// Discarded jobs promoted back into this core's ready queue.
    pub discarded_jobs: u64,
    /// Execution time still owed by jobs of this core's tasks when they were
    /// demoted into the discarded pool.
    pub discarded_jobs_available: f64,
    /// Execution time actually delivered to reclaimed jobs of this core's
    /// tasks (wherever they ran).
    pub discarded_jobs_executed: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimStats {
    pub per_core: Vec<CoreStats>,
}

impl SimStats {
    pub fn new(total_cores: usize) -> Self {
        Self { per_core: vec![CoreStats::default(); total_cores] }
    }

    pub fn core(&self, core_no: usize) -> &CoreStats {
        &self.per_core[core_no]
    }

    pub fn core_mut(&mut self, core_no: usize) -> &mut CoreStats {
        &mut self.per_core[core_no]
    }
}

//! Job instances: one mutable record per released job.
//!
//! A job lives in exactly one place at a time: a ready queue, the discarded
//! pool, or a core's `curr_exec_job` slot. Moves between them are ownership
//! transfers.

use crate::task::Task;

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub task_number: usize,
    pub job_number: usize,
    pub release_time: f64,
    /// `release_time + virtual_deadline` of the task at release; restored to
    /// the relative deadline when a mode change crosses the core threshold.
    pub absolute_deadline: f64,
    /// Actual execution time of this job.
    pub execution_time: f64,
    /// Execution time still owed; decreases as the job runs.
    pub rem_exec_time: f64,
    /// Budget left before the job is declared to exceed its WCET at the
    /// system level it was released at; extended on mode changes.
    pub wcet_counter: f64,
    /// Absolute time the job was last dispatched.
    pub scheduled_time: f64,
    /// Absolute time the current dispatch would finish, `scheduled_time +
    /// rem_exec_time` at dispatch.
    pub completion_time: f64,
    /// Set when the job was promoted back out of the discarded pool.
    pub reclaimed: bool,
}

impl Job {
    /// Build the job released by `task` at `release_time`, with the WCET
    /// budget of the current system criticality level.
    pub fn release(
        task: &Task,
        task_number: usize,
        job_number: usize,
        release_time: f64,
        sys_crit_level: usize,
    ) -> Self {
        let execution_time = task.exec_time(job_number);
        Self {
            task_number,
            job_number,
            release_time,
            absolute_deadline: release_time + task.virtual_deadline,
            execution_time,
            rem_exec_time: execution_time,
            wcet_counter: task.wcet[sys_crit_level],
            scheduled_time: 0.0,
            completion_time: 0.0,
            reclaimed: false,
        }
    }

    /// Work this job still has to account against the WCET of its own
    /// criticality level. Used by the slack analyzer and the reclaimer.
    pub fn wcet_residual(&self, task: &Task) -> f64 {
        task.wcet[task.criticality_lvl] - (self.execution_time - self.rem_exec_time)
    }
}

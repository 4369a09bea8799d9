//! Task model: immutable descriptors of the periodic workload.
//!
//! A task is frozen after [`TaskSet`] construction except for two fields the
//! scheduler owns: `virtual_deadline` (rewritten during mode setup and reset)
//! and `job_number` (the next release index, advanced as jobs arrive).

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::MAX_CRIT_LEVELS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Arrival time of the first job.
    pub phase: f64,
    /// Interarrival time of jobs.
    pub period: f64,
    /// Implicit-deadline model: equals the period.
    pub relative_deadline: f64,
    pub criticality_lvl: usize,
    /// Worst-case execution time per criticality level, nondecreasing.
    pub wcet: [f64; MAX_CRIT_LEVELS],
    /// `wcet[l] / period` per level.
    pub util: [f64; MAX_CRIT_LEVELS],
    /// Pinned core index.
    pub core: usize,
    /// EDF-VD deadline used while the system level is at or below the core
    /// threshold; equals `relative_deadline` otherwise.
    pub virtual_deadline: f64,
    /// Next release index.
    pub job_number: usize,
    /// Actual execution time of the j-th job, from the input provider.
    pub exec_times: Vec<f64>,
}

impl Task {
    pub fn new(
        phase: f64,
        relative_deadline: f64,
        criticality_lvl: usize,
        wcet: [f64; MAX_CRIT_LEVELS],
        core: usize,
    ) -> Self {
        let period = relative_deadline;
        let mut util = [0.0; MAX_CRIT_LEVELS];
        for (u, w) in util.iter_mut().zip(wcet.iter()) {
            *u = w / period;
        }
        Self {
            phase,
            period,
            relative_deadline,
            criticality_lvl,
            wcet,
            util,
            core,
            virtual_deadline: relative_deadline,
            job_number: 0,
            exec_times: Vec::new(),
        }
    }

    pub fn with_exec_times(mut self, exec_times: Vec<f64>) -> Self {
        self.exec_times = exec_times;
        self
    }

    /// Release time of the next (not yet arrived) job.
    pub fn next_release(&self) -> f64 {
        self.phase + self.period * self.job_number as f64
    }

    /// Actual execution time of the given job. Jobs past the end of the
    /// supplied trace run for their own-level WCET.
    pub fn exec_time(&self, job_number: usize) -> f64 {
        self.exec_times
            .get(job_number)
            .copied()
            .unwrap_or(self.wcet[self.criticality_lvl])
    }
}

/// The frozen task set, sorted by period ascending. Task numbers are post-sort
/// indices; jobs refer back to their task by that number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(mut tasks: Vec<Task>) -> Result<Self> {
        for (i, task) in tasks.iter().enumerate() {
            if task.period <= 0.0 {
                bail!("task {i}: period must be positive, got {}", task.period);
            }
            if task.phase < 0.0 {
                bail!("task {i}: phase must be nonnegative, got {}", task.phase);
            }
            if task.criticality_lvl >= MAX_CRIT_LEVELS {
                bail!(
                    "task {i}: criticality level {} out of range 0..{MAX_CRIT_LEVELS}",
                    task.criticality_lvl
                );
            }
            if task.wcet.windows(2).any(|w| w[1] < w[0]) {
                bail!("task {i}: WCET vector must be nondecreasing, got {:?}", task.wcet);
            }
        }
        tasks.sort_by(|a, b| a.period.total_cmp(&b.period));
        Ok(Self { tasks })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, task_number: usize) -> &Task {
        &self.tasks[task_number]
    }

    pub fn task_mut(&mut self, task_number: usize) -> &mut Task {
        &mut self.tasks[task_number]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn periods(&self) -> Vec<f64> {
        self.tasks.iter().map(|t| t.period).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_sorts_by_period() {
        let set = TaskSet::new(vec![
            Task::new(0.0, 20.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 6.0], 0),
        ])
        .unwrap();

        assert_eq!(set.task(0).period, 10.0);
        assert_eq!(set.task(1).period, 20.0);
    }

    #[test]
    fn utilization_follows_wcet() {
        let task = Task::new(0.0, 10.0, 1, [2.0, 6.0], 0);
        assert_eq!(task.util, [0.2, 0.6]);
    }

    #[test]
    fn rejects_decreasing_wcet() {
        let err = TaskSet::new(vec![Task::new(0.0, 10.0, 0, [5.0, 3.0], 0)]);
        assert!(err.is_err());
    }

    #[test]
    fn exec_time_falls_back_to_wcet_past_trace() {
        let task = Task::new(0.0, 10.0, 1, [2.0, 6.0], 0).with_exec_times(vec![1.5]);
        assert_eq!(task.exec_time(0), 1.5);
        assert_eq!(task.exec_time(1), 6.0);
    }

    #[test]
    fn next_release_advances_with_job_number() {
        let mut task = Task::new(3.0, 10.0, 0, [2.0, 2.0], 0);
        assert_eq!(task.next_release(), 3.0);
        task.job_number = 2;
        assert_eq!(task.next_release(), 23.0);
    }
}

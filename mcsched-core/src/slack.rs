//! Worst-case slack analysis.
//!
//! Answers one question for the reclaimer: between `now` and a target
//! absolute deadline on a given core, how much time is provably not needed by
//! the work that must run there first? Queued jobs are charged their
//! own-level WCET residual; future releases of tasks at or above the current
//! system level are projected up to the target. Work whose own deadline lies
//! beyond the target is charged proportionally to the window overlap, which
//! keeps the estimate conservative without forfeiting all of it.

use crate::job::Job;
use crate::queue::ReadyQueue;
use crate::task::TaskSet;

pub fn find_max_slack(
    tasks: &TaskSet,
    crit_level: usize,
    core_no: usize,
    target_deadline: f64,
    now: f64,
    ready: &ReadyQueue,
    running: Option<&Job>,
) -> f64 {
    let mut slack = target_deadline - now;

    // Confirmed work: the running job and everything queued on this core.
    for job in running.into_iter().chain(ready.iter()) {
        let task = tasks.task(job.task_number);
        let residual = job.wcet_residual(task);
        if job.absolute_deadline > target_deadline {
            slack -= (target_deadline - now) / (job.absolute_deadline - now) * residual;
        } else {
            slack -= residual;
        }
    }

    // Future releases that will claim time before the target.
    for task in tasks.iter() {
        if task.core != core_no || task.criticality_lvl < crit_level {
            continue;
        }
        let demand = task.wcet[task.criticality_lvl];
        let mut n = task.job_number;
        loop {
            let release = task.phase + task.period * n as f64;
            if release >= target_deadline {
                break;
            }
            let deadline = release + task.virtual_deadline;
            if deadline > target_deadline {
                slack -= (target_deadline - release) / task.period * demand;
            } else {
                slack -= demand;
            }
            n += 1;
        }
    }

    slack.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use crate::task::Task;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn taskset() -> TaskSet {
        TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0).with_exec_times(vec![4.0]),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0).with_exec_times(vec![5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_core_yields_full_window() {
        let mut tasks = taskset();
        // Both tasks already released their first job.
        tasks.task_mut(0).job_number = 1;
        tasks.task_mut(1).job_number = 1;

        let ready = ReadyQueue::new();
        let slack = find_max_slack(&tasks, 1, 0, 10.0, 5.0, &ready, None);
        assert!(close(slack, 5.0));
    }

    #[test]
    fn queued_jobs_charge_their_residual() {
        let mut tasks = taskset();
        tasks.task_mut(0).job_number = 1;
        tasks.task_mut(1).job_number = 1;

        let mut ready = ReadyQueue::new();
        let mut hi = Job::release(tasks.task(1), 1, 0, 0.0, 0);
        hi.rem_exec_time = 3.0;
        ready.insert(hi);

        // Residual of the HI job: 8 - (5 - 3) = 6, deadline inside the window.
        let slack = find_max_slack(&tasks, 1, 0, 10.0, 2.0, &ready, None);
        assert!(close(slack, 8.0 - 6.0));
    }

    #[test]
    fn future_releases_below_level_are_ignored() {
        let mut tasks = taskset();
        tasks.task_mut(1).job_number = 1;
        // LO task still has releases before the target, but the system runs
        // at HIGH: its releases will be skipped, not executed.
        let ready = ReadyQueue::new();
        let slack = find_max_slack(&tasks, 1, 0, 10.0, 5.0, &ready, None);
        assert!(close(slack, 5.0));
    }

    #[test]
    fn deadline_beyond_target_charges_proportionally() {
        let mut tasks = taskset();
        tasks.task_mut(0).job_number = 1;
        tasks.task_mut(1).job_number = 1;

        let mut ready = ReadyQueue::new();
        let mut hi = Job::release(tasks.task(1), 1, 0, 0.0, 0);
        hi.absolute_deadline = 20.0;
        hi.rem_exec_time = 5.0;
        ready.insert(hi);

        // Window 0..10 of a 0..20 deadline: half of the 8-unit residual.
        let slack = find_max_slack(&tasks, 1, 0, 10.0, 0.0, &ready, None);
        assert!(close(slack, 10.0 - 0.5 * 8.0));
    }

    #[test]
    fn never_negative() {
        let tasks = taskset();
        let ready = ReadyQueue::new();
        // First releases of both tasks still pending: demand far exceeds the
        // one-unit window.
        let slack = find_max_slack(&tasks, 0, 0, 1.0, 0.0, &ready, None);
        assert_eq!(slack, 0.0);
    }
}

//! Re-admission of discarded jobs.
//!
//! When a decision point leaves a core with provable slack, jobs demoted into
//! the discarded pool can be promoted back into that core's ready queue. The
//! pool is walked from the highest criticality level down, twice per level:
//! first the jobs whose task is pinned to the deciding core, then jobs from
//! other cores. A job may run on its own core whenever the slack covers its
//! residual; promotion across cores demands strictly more than the residual,
//! leaving headroom for the host core's native work.

use crate::config::MAX_CRIT_LEVELS;
use crate::job::Job;
use crate::queue::{DiscardedQueue, ReadyQueue};
use crate::slack::find_max_slack;
use crate::stats::SimStats;
use crate::task::TaskSet;
use crate::time::TIME_EPS;
use crate::trace::{TraceEvent, TraceSink};

#[allow(clippy::too_many_arguments)]
pub fn accommodate_discarded_jobs<S: TraceSink>(
    tasks: &TaskSet,
    discarded: &mut DiscardedQueue,
    core_no: usize,
    ready: &mut ReadyQueue,
    running: Option<&Job>,
    crit_level: usize,
    now: f64,
    stats: &mut SimStats,
    sink: &mut S,
) {
    if discarded.is_empty() {
        return;
    }

    for level in (0..MAX_CRIT_LEVELS).rev() {
        for own_core in [true, false] {
            let mut i = 0;
            while let Some(job) = discarded.get(i) {
                let task = tasks.task(job.task_number);
                if task.criticality_lvl != level || (task.core == core_no) != own_core {
                    i += 1;
                    continue;
                }

                let residual = job.wcet_residual(task);
                let slack =
                    find_max_slack(tasks, crit_level, core_no, job.absolute_deadline, now, ready, running);
                let admit = if own_core {
                    slack >= residual - TIME_EPS
                } else {
                    slack > residual + TIME_EPS
                };

                if admit {
                    let mut job = discarded.remove_at(i);
                    job.reclaimed = true;
                    sink.record(
                        core_no,
                        TraceEvent::Reclaimed { task: job.task_number, job: job.job_number, slack },
                    );
                    stats.core_mut(core_no).discarded_jobs += 1;
                    ready.insert(job);
                } else {
                    i += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use crate::trace::NullSink;

    fn pool_with(tasks: &TaskSet, task_number: usize, deadline: f64, rem: f64) -> DiscardedQueue {
        let mut job = Job::release(tasks.task(task_number), task_number, 0, 0.0, 0);
        job.absolute_deadline = deadline;
        job.rem_exec_time = rem;
        let mut pool = DiscardedQueue::new();
        pool.insert(job, tasks);
        pool
    }

    fn taskset(core_of_lo: usize) -> TaskSet {
        // Both tasks past their first release so the slack window is clean.
        let mut tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], core_of_lo).with_exec_times(vec![4.0]),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0).with_exec_times(vec![5.0]),
        ])
        .unwrap();
        tasks.task_mut(0).job_number = 1;
        tasks.task_mut(1).job_number = 1;
        tasks
    }

    #[test]
    fn own_core_job_admitted_when_slack_covers_residual() {
        let tasks = taskset(0);
        let mut pool = pool_with(&tasks, 0, 10.0, 4.0);
        let mut ready = ReadyQueue::new();
        let mut stats = SimStats::new(1);

        // Slack to deadline 10 at t = 6 is exactly the 4-unit residual.
        accommodate_discarded_jobs(
            &tasks, &mut pool, 0, &mut ready, None, 1, 6.0, &mut stats, &mut NullSink,
        );

        assert!(pool.is_empty());
        assert_eq!(ready.len(), 1);
        assert!(ready.front().unwrap().reclaimed);
        assert_eq!(stats.core(0).discarded_jobs, 1);
    }

    #[test]
    fn cross_core_job_needs_strict_slack() {
        // The LO task is pinned to core 1; core 0 decides.
        let tasks = taskset(1);
        let mut stats = SimStats::new(2);

        // Exactly-equal slack is not enough across cores.
        let mut pool = pool_with(&tasks, 0, 10.0, 4.0);
        let mut ready = ReadyQueue::new();
        accommodate_discarded_jobs(
            &tasks, &mut pool, 0, &mut ready, None, 1, 6.0, &mut stats, &mut NullSink,
        );
        assert_eq!(pool.len(), 1);
        assert!(ready.is_empty());

        // One spare unit beyond the residual admits it.
        accommodate_discarded_jobs(
            &tasks, &mut pool, 0, &mut ready, None, 1, 5.0, &mut stats, &mut NullSink,
        );
        assert!(pool.is_empty());
        assert_eq!(ready.len(), 1);
        assert_eq!(stats.core(0).discarded_jobs, 1);
    }

    #[test]
    fn queued_work_shrinks_the_slack() {
        let tasks = taskset(0);
        let mut pool = pool_with(&tasks, 0, 10.0, 4.0);
        let mut ready = ReadyQueue::new();
        // A HI job with 6 residual units already owns most of the window.
        let mut hi = Job::release(tasks.task(1), 1, 0, 0.0, 0);
        hi.rem_exec_time = 3.0;
        ready.insert(hi);
        let mut stats = SimStats::new(1);

        accommodate_discarded_jobs(
            &tasks, &mut pool, 0, &mut ready, None, 1, 2.0, &mut stats, &mut NullSink,
        );

        assert_eq!(pool.len(), 1);
        assert_eq!(stats.core(0).discarded_jobs, 0);
    }
}

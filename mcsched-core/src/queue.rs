//! Job queues: the per-core ready queue and the processor-wide discarded pool.
//!
//! Both are owned ordered lists. The ready queue is EDF order (absolute
//! deadline ascending, FIFO among equals); the discarded pool orders by task
//! criticality descending, then deadline ascending, so the reclaimer always
//! considers the most critical, most urgent work first.

use crate::job::Job;
use crate::task::TaskSet;
use crate::time::{TIME_EPS, approx_le};

#[derive(Debug, Clone, Default)]
pub struct ReadyQueue {
    jobs: Vec<Job>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping deadline order; a job ties behind existing equal
    /// deadlines, so earlier arrivals keep their position.
    pub fn insert(&mut self, job: Job) {
        let at = self
            .jobs
            .partition_point(|queued| queued.absolute_deadline <= job.absolute_deadline);
        self.jobs.insert(at, job);
    }

    pub fn pop_front(&mut self) -> Option<Job> {
        if self.jobs.is_empty() { None } else { Some(self.jobs.remove(0)) }
    }

    pub fn front(&self) -> Option<&Job> {
        self.jobs.first()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Mode-change walk: jobs below the new system level move out (returned
    /// in queue order for the discarded pool); survivors get their budget
    /// extended to the new level's WCET, and their deadline restored to the
    /// relative deadline when the change crossed the core threshold `k`.
    pub fn demote_low_crit(
        &mut self,
        tasks: &TaskSet,
        new_level: usize,
        threshold_k: usize,
    ) -> Vec<Job> {
        let mut demoted = Vec::new();
        let mut kept = Vec::with_capacity(self.jobs.len());

        for mut job in self.jobs.drain(..) {
            let task = tasks.task(job.task_number);
            if task.criticality_lvl < new_level {
                demoted.push(job);
            } else {
                if new_level > threshold_k {
                    job.absolute_deadline = job.release_time + task.relative_deadline;
                }
                job.wcet_counter += task.wcet[new_level] - task.wcet[new_level - 1];
                kept.push(job);
            }
        }

        // Deadline restoration can reorder; restore the EDF invariant.
        kept.sort_by(|a, b| a.absolute_deadline.total_cmp(&b.absolute_deadline));
        self.jobs = kept;
        demoted
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscardedQueue {
    jobs: Vec<Job>,
}

impl DiscardedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn sort_key(&self, job: &Job, tasks: &TaskSet) -> (usize, f64) {
        (tasks.task(job.task_number).criticality_lvl, job.absolute_deadline)
    }

    /// Insert keeping (criticality descending, deadline ascending) order,
    /// behind existing equals.
    pub fn insert(&mut self, job: Job, tasks: &TaskSet) {
        let (crit, deadline) = self.sort_key(&job, tasks);
        let at = self.jobs.partition_point(|queued| {
            let (qc, qd) = self.sort_key(queued, tasks);
            qc > crit || (qc == crit && qd <= deadline)
        });
        self.jobs.insert(at, job);
    }

    /// Drop every job whose deadline has passed by `now`. Runs before any
    /// reclamation or dispatch at a decision point.
    pub fn purge_expired(&mut self, now: f64) -> Vec<Job> {
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.jobs.len());
        for job in self.jobs.drain(..) {
            if approx_le(job.absolute_deadline, now) {
                expired.push(job);
            } else {
                kept.push(job);
            }
        }
        self.jobs = kept;
        expired
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Job {
        self.jobs.remove(index)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}

/// Ordering check used by the loop-boundary debug assertions.
pub fn ready_queue_ordered(queue: &ReadyQueue) -> bool {
    queue
        .jobs
        .windows(2)
        .all(|w| w[0].absolute_deadline <= w[1].absolute_deadline + TIME_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use crate::task::{Task, TaskSet};

    fn job(task_number: usize, deadline: f64) -> Job {
        Job {
            task_number,
            job_number: 0,
            release_time: 0.0,
            absolute_deadline: deadline,
            execution_time: 1.0,
            rem_exec_time: 1.0,
            wcet_counter: 1.0,
            scheduled_time: 0.0,
            completion_time: 0.0,
            reclaimed: false,
        }
    }

    #[test]
    fn ready_queue_keeps_edf_order_with_stable_ties() {
        let mut queue = ReadyQueue::new();
        queue.insert(job(0, 10.0));
        queue.insert(job(1, 5.0));
        queue.insert(job(2, 10.0));

        let order: Vec<usize> = queue.iter().map(|j| j.task_number).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert!(ready_queue_ordered(&queue));
    }

    #[test]
    fn demotion_moves_low_crit_and_extends_budgets() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0),
        ])
        .unwrap();
        // Post-sort: both period 10, order preserved: 0 = LO, 1 = HI.

        let mut queue = ReadyQueue::new();
        let mut hi = job(1, 5.0);
        hi.wcet_counter = 0.0;
        queue.insert(hi);
        queue.insert(job(0, 10.0));

        let demoted = queue.demote_low_crit(&tasks, 1, 0);
        assert_eq!(demoted.len(), 1);
        assert_eq!(demoted[0].task_number, 0);

        let survivor = queue.front().unwrap();
        assert_eq!(survivor.task_number, 1);
        // Crossed the threshold: deadline back to release + D.
        assert_eq!(survivor.absolute_deadline, 10.0);
        // Budget extended by WCET[1] - WCET[0].
        assert_eq!(survivor.wcet_counter, 6.0);
    }

    #[test]
    fn discarded_queue_orders_by_crit_then_deadline() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0),
        ])
        .unwrap();

        let mut pool = DiscardedQueue::new();
        pool.insert(job(0, 5.0), &tasks);
        pool.insert(job(1, 20.0), &tasks);
        pool.insert(job(1, 10.0), &tasks);

        let order: Vec<(usize, f64)> = pool.iter().map(|j| (j.task_number, j.absolute_deadline)).collect();
        assert_eq!(order, vec![(1, 10.0), (1, 20.0), (0, 5.0)]);
    }

    #[test]
    fn purge_drops_expired_only() {
        let tasks = TaskSet::new(vec![Task::new(0.0, 10.0, 0, [4.0, 4.0], 0)]).unwrap();
        let mut pool = DiscardedQueue::new();
        pool.insert(job(0, 5.0), &tasks);
        pool.insert(job(0, 8.0), &tasks);

        let expired = pool.purge_expired(5.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].absolute_deadline, 5.0);
        assert_eq!(pool.len(), 1);
    }
}

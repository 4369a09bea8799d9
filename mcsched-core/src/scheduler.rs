//! The scheduler driver: owns the platform state and advances it decision
//! point by decision point until the hyperperiod.
//!
//! Each iteration asks the decision engine for the globally next event,
//! purges expired discarded jobs, applies the transition for the event kind,
//! and reports what happened through the trace sink. All process-wide state
//! (statistics, the discarded pool, the sink) lives in the [`Simulation`]
//! context; there are no globals.

use anyhow::Result;

use crate::config::MAX_CRIT_LEVELS;
use crate::decision::{DecisionKind, DecisionPoint, find_decision_point};
use crate::job::Job;
use crate::platform::{Core, CoreParams, CoreState, Processor};
use crate::queue::ready_queue_ordered;
use crate::reclaim::accommodate_discarded_jobs;
use crate::schedulability::{reset_virtual_deadlines, set_virtual_deadlines};
use crate::stats::SimStats;
use crate::task::TaskSet;
use crate::time::{self, TIME_EPS, approx_le};
use crate::trace::{TraceEvent, TraceSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    /// The run reached the hyperperiod (or ran out of progress) normally.
    Completed,
    /// No core was schedulable; nothing was simulated.
    Infeasible,
}

pub struct Simulation<S: TraceSink> {
    tasks: TaskSet,
    processor: Processor,
    stats: SimStats,
    hyperperiod: f64,
    sink: S,
}

impl<S: TraceSink> Simulation<S> {
    /// Set up the platform: apply the per-core EDF-VD parameters, install
    /// virtual deadlines, and shut down cores declared unschedulable
    /// (`x_factor == 0`).
    pub fn new(tasks: TaskSet, core_params: &[CoreParams], sink: S) -> Result<Self> {
        let hyperperiod = time::hyperperiod(&tasks.periods())?;
        let mut tasks = tasks;
        let mut processor = Processor::new(core_params.len());

        for (core_no, params) in core_params.iter().enumerate() {
            let core = &mut processor.cores[core_no];
            if params.x_factor == 0.0 {
                core.state = CoreState::Shutdown;
                core.x_factor = 0.0;
            } else {
                core.x_factor = params.x_factor;
                core.threshold_crit_lvl = params.threshold_crit_lvl;
                set_virtual_deadlines(&mut tasks, core_no, params.x_factor, params.threshold_crit_lvl);
            }
        }

        let stats = SimStats::new(core_params.len());
        Ok(Self { tasks, processor, stats, hyperperiod, sink })
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn hyperperiod(&self) -> f64 {
        self.hyperperiod
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// At least one core survived setup.
    pub fn schedulable(&self) -> bool {
        self.processor.cores.iter().any(|c| c.x_factor > 0.0)
    }

    /// Run the decision loop to the hyperperiod.
    pub fn run(&mut self) -> SimOutcome {
        if !self.schedulable() {
            return SimOutcome::Infeasible;
        }

        loop {
            let Some(decision) = find_decision_point(&self.tasks, &self.processor) else {
                break;
            };
            if decision.time >= self.hyperperiod - TIME_EPS {
                break;
            }
            self.step(decision);
            debug_assert!(self.invariants_hold());
        }

        self.close_out();
        SimOutcome::Completed
    }

    fn step(&mut self, decision: DecisionPoint) {
        let DecisionPoint { core_no, time, mut kind } = decision;

        // Expired discarded jobs are dropped before anything else at t.
        let expired = self.processor.discarded_queue.purge_expired(time);
        for job in expired {
            let owner = self.tasks.task(job.task_number).core;
            self.sink.record(
                owner,
                TraceEvent::DiscardExpired {
                    task: job.task_number,
                    job: job.job_number,
                    deadline: job.absolute_deadline,
                },
            );
        }

        // An arrival whose elapsed-slice debit would exhaust the running
        // job's budget is a criticality change at this very instant, not a
        // completion: the budget ran out, the execution did not.
        if kind == DecisionKind::Arrival && self.processor.crit_level < MAX_CRIT_LEVELS - 1 {
            let core = &self.processor.cores[core_no];
            if let Some(job) = &core.curr_exec_job
                && job.wcet_counter - (time - core.total_time) <= TIME_EPS
            {
                kind = DecisionKind::CritChange;
            }
        }

        self.sink.record(
            core_no,
            TraceEvent::Decision { kind, time, crit_level: self.processor.crit_level },
        );

        match kind {
            DecisionKind::Arrival => {
                self.stats.core_mut(core_no).arrival_points += 1;
                self.handle_arrival(core_no, time);
            }
            DecisionKind::Completion => {
                self.stats.core_mut(core_no).completion_points += 1;
                self.handle_completion(core_no, time);
            }
            DecisionKind::CritChange => {
                self.stats.core_mut(core_no).criticality_change_points += 1;
                self.handle_crit_change(core_no, time);
            }
            DecisionKind::TimerExpire => {
                self.stats.core_mut(core_no).wakeup_points += 1;
                self.handle_wakeup(core_no, time);
            }
        }

        // What the deciding core ended up doing.
        let core = &self.processor.cores[core_no];
        if let Some(job) = &core.curr_exec_job {
            self.sink.record(core_no, Self::scheduled_snapshot(core, job));
        } else if core.state != CoreState::Faulted {
            self.sink.record(core_no, TraceEvent::Idle);
        }
        self.sink.record(core_no, TraceEvent::EndOfDecision);
    }

    fn handle_arrival(&mut self, core_no: usize, now: f64) {
        let Simulation { tasks, processor, stats, sink, .. } = self;
        let Processor { cores, discarded_queue, crit_level } = processor;
        let crit = *crit_level;
        let core = &mut cores[core_no];

        let delta = now - core.total_time;
        core.total_time = now;
        match &mut core.curr_exec_job {
            None => {
                core.total_idle_time += delta;
                stats.core_mut(core_no).idle_energy += delta;
            }
            Some(job) => {
                job.rem_exec_time -= delta;
                job.wcet_counter -= delta;
                stats.core_mut(core_no).active_energy += delta;
                if job.reclaimed {
                    let owner = tasks.task(job.task_number).core;
                    stats.core_mut(owner).discarded_jobs_executed += delta;
                }
            }
        }

        Self::release_arrivals(tasks, core, core_no, crit, now, sink);

        accommodate_discarded_jobs(
            tasks,
            discarded_queue,
            core_no,
            &mut core.ready_queue,
            core.curr_exec_job.as_ref(),
            crit,
            now,
            stats,
            sink,
        );

        // A strictly earlier deadline at the head preempts the running job.
        let preempt = match (&core.curr_exec_job, core.ready_queue.front()) {
            (None, Some(_)) => true,
            (Some(curr), Some(head)) => head.absolute_deadline < curr.absolute_deadline,
            (_, None) => false,
        };
        if preempt {
            if let Some(curr) = core.curr_exec_job.take() {
                sink.record(
                    core_no,
                    TraceEvent::Preempted { task: curr.task_number, job: curr.job_number },
                );
                core.ready_queue.insert(curr);
            }
            Self::schedule_new_job(core);
            stats.core_mut(core_no).context_switches += 1;
        }
    }

    /// Queue every release of this core's tasks that is due at `now`,
    /// highest criticality level first. Releases whose deadline already
    /// passed are skipped by advancing the release index; releases of tasks
    /// below the system level are consumed without admitting a job.
    fn release_arrivals(
        tasks: &mut TaskSet,
        core: &mut Core,
        core_no: usize,
        crit: usize,
        now: f64,
        sink: &mut S,
    ) {
        for level in (0..MAX_CRIT_LEVELS).rev() {
            for task_number in 0..tasks.len() {
                {
                    let task = tasks.task_mut(task_number);
                    if task.core != core_no || task.criticality_lvl != level {
                        continue;
                    }
                    while approx_le(task.next_release() + task.virtual_deadline, now) {
                        task.job_number += 1;
                    }
                }

                let task = tasks.task(task_number);
                if task.next_release() <= now + TIME_EPS {
                    if task.criticality_lvl >= crit {
                        let job =
                            Job::release(task, task_number, task.job_number, task.next_release(), crit);
                        sink.record(
                            core_no,
                            TraceEvent::JobArrived {
                                task: task_number,
                                job: job.job_number,
                                exec_time: job.execution_time,
                                over_budget: job.execution_time > task.wcet[crit],
                            },
                        );
                        core.ready_queue.insert(job);
                    }
                    tasks.task_mut(task_number).job_number += 1;
                }
            }
        }
    }

    fn handle_completion(&mut self, core_no: usize, now: f64) {
        let Simulation { tasks, processor, stats, sink, .. } = self;
        let Processor { cores, discarded_queue, crit_level } = processor;
        let crit = *crit_level;
        let core = &mut cores[core_no];

        let delta = now - core.total_time;
        core.total_time = now;
        let Some(mut job) = core.curr_exec_job.take() else {
            return;
        };

        if job.absolute_deadline < now - TIME_EPS {
            sink.record(
                core_no,
                TraceEvent::DeadlineMiss {
                    task: job.task_number,
                    job: job.job_number,
                    deadline: job.absolute_deadline,
                },
            );
            core.state = CoreState::Faulted;
            return;
        }

        stats.core_mut(core_no).active_energy += delta;
        job.rem_exec_time = (job.rem_exec_time - delta).max(0.0);
        if job.reclaimed {
            let owner = tasks.task(job.task_number).core;
            stats.core_mut(owner).discarded_jobs_executed += delta;
        }
        sink.record(core_no, TraceEvent::Completed { task: job.task_number, job: job.job_number });
        drop(job);

        // The finished job may have left slack behind; offer it to the pool
        // before the core goes idle.
        accommodate_discarded_jobs(
            tasks,
            discarded_queue,
            core_no,
            &mut core.ready_queue,
            None,
            crit,
            now,
            stats,
            sink,
        );

        if !core.ready_queue.is_empty() {
            stats.core_mut(core_no).context_switches += 1;
            Self::schedule_new_job(core);
        }
    }

    fn handle_crit_change(&mut self, decision_core: usize, now: f64) {
        let Simulation { tasks, processor, stats, sink, .. } = self;
        let Processor { cores, discarded_queue, crit_level } = processor;
        *crit_level = (*crit_level + 1).min(MAX_CRIT_LEVELS - 1);
        let new_level = *crit_level;

        for core_no in 0..cores.len() {
            if new_level > cores[core_no].threshold_crit_lvl {
                reset_virtual_deadlines(tasks, core_no, cores[core_no].threshold_crit_lvl);
            }
            sink.record(core_no, TraceEvent::CritChanged { level: new_level });

            let core = &mut cores[core_no];
            if core.state != CoreState::Active {
                continue;
            }

            let delta = now - core.total_time;
            core.total_time = now;
            match core.curr_exec_job.take() {
                Some(mut job) => {
                    job.rem_exec_time -= delta;
                    job.wcet_counter -= delta;
                    stats.core_mut(core_no).active_energy += delta;
                    if job.reclaimed {
                        let owner = tasks.task(job.task_number).core;
                        stats.core_mut(owner).discarded_jobs_executed += delta;
                    }
                    // The running job rejoins the queue so the mode-change
                    // walk treats it like any other ready job.
                    core.ready_queue.insert(job);
                }
                None => {
                    core.total_idle_time += delta;
                    stats.core_mut(core_no).idle_energy += delta;
                }
            }

            let demoted =
                core.ready_queue.demote_low_crit(tasks, new_level, core.threshold_crit_lvl);
            for job in demoted {
                let owner = tasks.task(job.task_number).core;
                stats.core_mut(owner).discarded_jobs_available += job.rem_exec_time;
                sink.record(
                    core_no,
                    TraceEvent::Demoted {
                        task: job.task_number,
                        job: job.job_number,
                        rem_exec_time: job.rem_exec_time,
                    },
                );
                discarded_queue.insert(job, tasks);
            }

            if !core.ready_queue.is_empty() {
                stats.core_mut(core_no).context_switches += 1;
                Self::schedule_new_job(core);
                // The deciding core's snapshot is reported at the end of the
                // decision; the others are reported here.
                if core_no != decision_core
                    && let Some(job) = &core.curr_exec_job
                {
                    sink.record(core_no, Self::scheduled_snapshot(core, job));
                }
            }
        }
    }

    fn handle_wakeup(&mut self, core_no: usize, now: f64) {
        {
            let core = &mut self.processor.cores[core_no];
            let delta = now - core.total_time;
            core.total_time = now;
            core.total_idle_time += delta;
            core.state = CoreState::Active;
            core.next_invocation_time = f64::INFINITY;
            self.stats.core_mut(core_no).shutdown_time += delta;
            self.sink.record(core_no, TraceEvent::Wakeup);
        }
        // A woken core immediately looks for work.
        self.handle_arrival(core_no, now);
    }

    fn schedule_new_job(core: &mut Core) {
        if let Some(mut job) = core.ready_queue.pop_front() {
            job.scheduled_time = core.total_time;
            job.completion_time = core.total_time + job.rem_exec_time;
            core.wcet_counter = job.scheduled_time + job.wcet_counter;
            core.curr_exec_job = Some(job);
        }
    }

    fn scheduled_snapshot(core: &Core, job: &Job) -> TraceEvent {
        TraceEvent::Scheduled {
            task: job.task_number,
            job: job.job_number,
            exec_time: job.execution_time,
            rem_exec_time: job.rem_exec_time,
            wcet_counter: core.wcet_counter,
            deadline: job.absolute_deadline,
        }
    }

    /// Close the final slice of every surviving core at the hyperperiod.
    fn close_out(&mut self) {
        let Simulation { tasks, processor, stats, hyperperiod, .. } = self;
        for (core_no, core) in processor.cores.iter_mut().enumerate() {
            if core.state == CoreState::Faulted {
                continue;
            }
            let slice = (*hyperperiod - core.total_time).max(0.0);
            match core.state {
                CoreState::Shutdown => {
                    core.total_idle_time += slice;
                    stats.core_mut(core_no).shutdown_time += slice;
                }
                CoreState::Active => match &mut core.curr_exec_job {
                    None => {
                        core.total_idle_time += slice;
                        stats.core_mut(core_no).idle_energy += slice;
                    }
                    Some(job) => {
                        job.rem_exec_time -= slice;
                        stats.core_mut(core_no).active_energy += slice;
                        if job.reclaimed {
                            let owner = tasks.task(job.task_number).core;
                            stats.core_mut(owner).discarded_jobs_executed += slice;
                        }
                    }
                },
                CoreState::Faulted => unreachable!(),
            }
            core.total_time = *hyperperiod;
        }
    }

    fn invariants_hold(&self) -> bool {
        // Queues sorted, no job owed negative work, one owner per job.
        let mut seen = std::collections::HashSet::new();
        for core in &self.processor.cores {
            if !ready_queue_ordered(&core.ready_queue) {
                return false;
            }
            for job in core.ready_queue.iter().chain(core.curr_exec_job.as_ref()) {
                if job.rem_exec_time < -TIME_EPS {
                    return false;
                }
                if !seen.insert((job.task_number, job.job_number)) {
                    return false;
                }
            }
        }
        self.processor
            .discarded_queue
            .iter()
            .all(|job| seen.insert((job.task_number, job.job_number)))
    }
}

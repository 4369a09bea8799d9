//! Trace sink and report writers: renders kernel events into the per-core
//! logs, the global log and the statistics file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mcsched_core::decision::DecisionKind;
use mcsched_core::platform::{CoreParams, CoreState, Processor};
use mcsched_core::scheduler::SimOutcome;
use mcsched_core::stats::SimStats;
use mcsched_core::task::TaskSet;
use mcsched_core::trace::{TraceEvent, TraceSink};

const RULE: &str = "____________________________________________________________________________________________________";

/// Accumulates one chronological log per core; written out after the run.
pub struct FileSink {
    logs: Vec<String>,
}

impl FileSink {
    pub fn new(total_cores: usize) -> Self {
        let logs = (0..total_cores)
            .map(|core| format!("Schedule for core {core}\n\n"))
            .collect();
        Self { logs }
    }

    /// Write `output_<i>.txt` into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for (core, log) in self.logs.iter().enumerate() {
            let path = dir.join(format!("output_{core}.txt"));
            fs::write(&path, log)
                .with_context(|| format!("cannot write core log {}", path.display()))?;
        }
        Ok(())
    }
}

impl TraceSink for FileSink {
    fn record(&mut self, core_no: usize, event: TraceEvent) {
        let log = &mut self.logs[core_no];
        log.push_str(&format_event(&event));
    }
}

fn kind_name(kind: DecisionKind) -> &'static str {
    match kind {
        DecisionKind::Arrival => "ARRIVAL",
        DecisionKind::Completion => "COMPLETION",
        DecisionKind::TimerExpire => "TIMER_EXPIRE",
        DecisionKind::CritChange => "CRIT_CHANGE",
    }
}

pub fn format_event(event: &TraceEvent) -> String {
    match event {
        TraceEvent::Decision { kind, time, crit_level } => format!(
            "Decision point: {}, Decision time: {time:.5}, Crit level: {crit_level}\n",
            kind_name(*kind)
        ),
        TraceEvent::JobArrived { task, job, exec_time, over_budget } => format!(
            "Job {task},{job} arrived | Exec time: {exec_time:.5} | {}\n",
            if *over_budget { "exceeds WCET" } else { "within WCET" }
        ),
        TraceEvent::Scheduled { task, job, exec_time, rem_exec_time, wcet_counter, deadline } => {
            format!(
                "Scheduled job: {task},{job}  Exec time: {exec_time:.5}  Rem exec time: \
                 {rem_exec_time:.5}  WCET counter: {wcet_counter:.5}  Deadline: {deadline:.5}\n"
            )
        }
        TraceEvent::Preempted { task, job } => format!("Preempting job {task},{job}\n"),
        TraceEvent::Completed { task, job } => format!("Job {task},{job} completed execution\n"),
        TraceEvent::DeadlineMiss { task, job, deadline } => format!(
            "Job {task},{job} missed its deadline {deadline:.5}. Halting this core\n"
        ),
        TraceEvent::CritChanged { level } => {
            format!("Criticality changed | Crit level: {level}\n")
        }
        TraceEvent::Demoted { task, job, rem_exec_time } => format!(
            "Job {task},{job} moved to discarded queue | Rem exec time: {rem_exec_time:.5}\n"
        ),
        TraceEvent::DiscardExpired { task, job, deadline } => format!(
            "Discarded job {task},{job} dropped | Deadline {deadline:.5} passed\n"
        ),
        TraceEvent::Reclaimed { task, job, slack } => format!(
            "Job {task},{job} inserted in ready queue | Max slack: {slack:.5}\n"
        ),
        TraceEvent::Idle => "No job to execute. Core is idle\n".to_string(),
        TraceEvent::Wakeup => "Core woken up\n".to_string(),
        TraceEvent::EndOfDecision => format!("\n{RULE}\n\n"),
    }
}

fn state_name(state: CoreState) -> &'static str {
    match state {
        CoreState::Active => "ACTIVE",
        CoreState::Shutdown => "SHUTDOWN",
        CoreState::Faulted => "FAULTED",
    }
}

/// The global log: platform parameters, the sorted task list, and the final
/// per-core summary.
pub fn write_global_report(
    path: &Path,
    tasks: &TaskSet,
    core_params: &[CoreParams],
    outcome: SimOutcome,
    hyperperiod: f64,
    processor: &Processor,
) -> Result<()> {
    let mut out = String::new();

    for (core, params) in core_params.iter().enumerate() {
        if params.x_factor > 0.0 {
            let _ = writeln!(
                out,
                "Core: {core} | x factor: {:.5} | threshold level: {}",
                params.x_factor, params.threshold_crit_lvl
            );
        } else {
            let _ = writeln!(out, "Core: {core} | unschedulable, shut down");
        }
    }
    out.push_str(if outcome == SimOutcome::Infeasible { "Not schedulable\n" } else { "Schedulable\n" });

    out.push_str("\nTaskset:\n");
    for (number, task) in tasks.iter().enumerate() {
        let _ = write!(
            out,
            "Task: {number} | core: {} | crit level: {} | phase: {:.2} | rel deadline: {:.2} | \
             virt deadline: {:.2} | WCET:",
            task.core, task.criticality_lvl, task.phase, task.relative_deadline,
            task.virtual_deadline
        );
        for wcet in &task.wcet {
            let _ = write!(out, " {wcet:.2}");
        }
        out.push_str(" | Util:");
        for util in &task.util {
            let _ = write!(out, " {util:.3}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\nHyperperiod: {hyperperiod:.5}");

    if outcome == SimOutcome::Completed {
        out.push_str("\nProcessor statistics:\n");
        let _ = writeln!(out, "Num cores: {}", processor.total_cores());
        for (core_no, core) in processor.cores.iter().enumerate() {
            let _ = writeln!(
                out,
                "Core: {core_no}, total time: {:.2}, total idle time: {:.2}, total busy time: \
                 {:.2}, state: {}",
                core.total_time,
                core.total_idle_time,
                core.total_time - core.total_idle_time,
                state_name(core.state)
            );
        }
    }

    fs::write(path, out).with_context(|| format!("cannot write {}", path.display()))
}

/// One line per core:
/// `active_energy idle_energy shutdown_time discarded_jobs completion_points
/// discarded_executed discarded_available`.
pub fn write_statistics(path: &Path, stats: &SimStats) -> Result<()> {
    let mut out = String::new();
    for core in &stats.per_core {
        let _ = writeln!(
            out,
            "{:.2} {:.2} {:.2} {} {} {:.2} {:.2}",
            core.active_energy,
            core.idle_energy,
            core.shutdown_time,
            core.discarded_jobs,
            core.completion_points,
            core.discarded_jobs_executed,
            core.discarded_jobs_available,
        );
    }
    fs::write(path, out).with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_header_format() {
        let line = format_event(&TraceEvent::Decision {
            kind: DecisionKind::CritChange,
            time: 3.0,
            crit_level: 0,
        });
        assert_eq!(line, "Decision point: CRIT_CHANGE, Decision time: 3.00000, Crit level: 0\n");
    }

    #[test]
    fn scheduled_line_carries_all_counters() {
        let line = format_event(&TraceEvent::Scheduled {
            task: 1,
            job: 0,
            exec_time: 5.0,
            rem_exec_time: 2.0,
            wcet_counter: 6.0,
            deadline: 10.0,
        });
        assert!(line.starts_with("Scheduled job: 1,0"));
        assert!(line.contains("Rem exec time: 2.00000"));
        assert!(line.contains("WCET counter: 6.00000"));
        assert!(line.contains("Deadline: 10.00000"));
    }

    #[test]
    fn statistics_line_format() {
        let mut stats = SimStats::new(1);
        let core = stats.core_mut(0);
        core.active_energy = 9.0;
        core.idle_energy = 1.0;
        core.discarded_jobs = 1;
        core.completion_points = 2;
        core.discarded_jobs_executed = 4.0;
        core.discarded_jobs_available = 4.0;

        let dir = std::env::temp_dir()
            .join(format!("mcsched-report-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("statistics.txt");
        write_statistics(&path, &stats).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "9.00 1.00 0.00 1 2 4.00 4.00\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sink_collects_per_core_logs() {
        let mut sink = FileSink::new(2);
        sink.record(1, TraceEvent::Idle);
        assert!(sink.logs[1].contains("Core is idle"));
        assert!(!sink.logs[0].contains("Core is idle"));
    }
}

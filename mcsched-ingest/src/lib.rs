//! mcsched-ingest: text-file input provider for the simulator.
//!
//! Reads the four input files of a workload directory, cross-checks them, and
//! assembles the frozen [`TaskSet`] plus per-core parameters the kernel runs
//! on.

pub mod parsers;
pub mod types;

pub use parsers::allocation::parse_allocation;
pub use parsers::core_config::parse_core_config;
pub use parsers::exec_times::parse_exec_times;
pub use parsers::task_list::parse_task_list;
pub use types::{TaskRecord, Workload};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use mcsched_core::task::{Task, TaskSet};
use tracing::warn;

pub const TASK_LIST_FILE: &str = "input.txt";
pub const EXEC_TIMES_FILE: &str = "input_times.txt";
pub const ALLOCATION_FILE: &str = "input_allocation.txt";
pub const CORE_CONFIG_FILE: &str = "input_cores.txt";

fn read_input(dir: &Path, name: &str) -> Result<String> {
    fs::read_to_string(dir.join(name)).with_context(|| format!("cannot read input file {name}"))
}

/// Load a complete workload from `dir`.
///
/// A missing execution-trace file degrades to a deterministic trace where
/// every job runs for its own-level WCET; all other files are required.
pub fn load_workload(dir: &Path) -> Result<Workload> {
    let records = parse_task_list(&read_input(dir, TASK_LIST_FILE)?)
        .with_context(|| format!("malformed {TASK_LIST_FILE}"))?;
    let allocation = parse_allocation(&read_input(dir, ALLOCATION_FILE)?, records.len())
        .with_context(|| format!("malformed {ALLOCATION_FILE}"))?;
    let core_params = parse_core_config(&read_input(dir, CORE_CONFIG_FILE)?)
        .with_context(|| format!("malformed {CORE_CONFIG_FILE}"))?;

    let traces = match fs::read_to_string(dir.join(EXEC_TIMES_FILE)) {
        Ok(text) => parse_exec_times(&text, records.len())
            .with_context(|| format!("malformed {EXEC_TIMES_FILE}"))?,
        Err(_) => {
            warn!(
                file = EXEC_TIMES_FILE,
                "no execution trace; every job will run for its own-level WCET"
            );
            vec![Vec::new(); records.len()]
        }
    };

    for (task, &core) in allocation.iter().enumerate() {
        if core >= core_params.len() {
            bail!(
                "task {task} allocated to core {core}, but the platform has {} cores",
                core_params.len()
            );
        }
    }

    let tasks: Vec<Task> = records
        .iter()
        .zip(allocation)
        .zip(traces)
        .map(|((record, core), trace)| {
            Task::new(
                record.phase,
                record.relative_deadline,
                record.criticality_lvl,
                record.wcet,
                core,
            )
            .with_exec_times(trace)
        })
        .collect();

    let task_set = TaskSet::new(tasks).context("invalid task set")?;
    Ok(Workload { task_set, core_params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct WorkloadDir(std::path::PathBuf);

    impl WorkloadDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("mcsched-ingest-{name}-{}", std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, name: &str, contents: &str) {
            fs::write(self.0.join(name), contents).unwrap();
        }
    }

    impl Drop for WorkloadDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn write_minimal(dir: &WorkloadDir) {
        dir.write(TASK_LIST_FILE, "2\n0 10 0 4 4\n0 5 1 2 3\n");
        dir.write(ALLOCATION_FILE, "0 0\n1 1\n");
        dir.write(CORE_CONFIG_FILE, "1.0 1\n0.5 0\n");
        dir.write(EXEC_TIMES_FILE, "1 3.5\n2 2 2.5\n");
    }

    #[test]
    fn loads_and_freezes_a_workload() {
        let dir = WorkloadDir::new("happy");
        write_minimal(&dir);

        let workload = load_workload(&dir.0).unwrap();
        assert_eq!(workload.core_params.len(), 2);
        assert_eq!(workload.task_set.len(), 2);

        // Sorted by period: the HI task (period 5) comes first and kept its
        // trace through the sort.
        let first = workload.task_set.task(0);
        assert_eq!(first.period, 5.0);
        assert_eq!(first.criticality_lvl, 1);
        assert_eq!(first.core, 1);
        assert_eq!(first.exec_times, vec![2.0, 2.5]);
    }

    #[test]
    fn missing_trace_file_degrades_to_wcet() {
        let dir = WorkloadDir::new("no-trace");
        write_minimal(&dir);
        fs::remove_file(dir.0.join(EXEC_TIMES_FILE)).unwrap();

        let workload = load_workload(&dir.0).unwrap();
        // Empty trace: each job falls back to the task's own-level WCET.
        assert_eq!(workload.task_set.task(0).exec_time(0), 3.0);
    }

    #[test]
    fn missing_task_list_is_fatal() {
        let dir = WorkloadDir::new("no-tasks");
        write_minimal(&dir);
        fs::remove_file(dir.0.join(TASK_LIST_FILE)).unwrap();

        let err = load_workload(&dir.0).unwrap_err();
        assert!(format!("{err:#}").contains(TASK_LIST_FILE));
    }

    #[test]
    fn allocation_to_unknown_core_is_fatal() {
        let dir = WorkloadDir::new("bad-core");
        write_minimal(&dir);
        dir.write(ALLOCATION_FILE, "0 0\n1 7\n");

        let err = load_workload(&dir.0).unwrap_err();
        assert!(err.to_string().contains("core 7"));
    }
}

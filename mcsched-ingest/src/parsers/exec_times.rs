//! Execution-trace parser (`input_times.txt`).
//!
//! For each task, in task-list order: a job count `M`, then `M` actual
//! execution times. The trace captures runtime variation against the WCET;
//! jobs beyond the trace run for their own-level WCET.

use anyhow::{Context, Result, bail};

use super::TokenReader;

pub fn parse_exec_times(text: &str, total_tasks: usize) -> Result<Vec<Vec<f64>>> {
    let mut reader = TokenReader::new(text);
    let mut traces = Vec::with_capacity(total_tasks);

    for task in 0..total_tasks {
        let trace = parse_trace(&mut reader).with_context(|| format!("task {task}"))?;
        traces.push(trace);
    }

    if !reader.is_exhausted() {
        bail!("trailing data after {total_tasks} execution traces");
    }
    Ok(traces)
}

fn parse_trace(reader: &mut TokenReader<'_>) -> Result<Vec<f64>> {
    let jobs: usize = reader.next("job count")?;
    let mut times = Vec::with_capacity(jobs);
    for job in 0..jobs {
        let time: f64 = reader.next(&format!("execution time of job {job}"))?;
        if time <= 0.0 {
            bail!("execution time of job {job} must be positive, got {time}");
        }
        times.push(time);
    }
    Ok(times)
}

//! Task-list parser (`input.txt`).
//!
//! Format: a task count `N`, then `N` records of
//! `phase deadline crit_level WCET[0] .. WCET[Lmax-1]`.

use anyhow::{Context, Result, bail};
use mcsched_core::config::MAX_CRIT_LEVELS;

use super::TokenReader;
use crate::types::TaskRecord;

pub fn parse_task_list(text: &str) -> Result<Vec<TaskRecord>> {
    let mut reader = TokenReader::new(text);
    let total: usize = reader.next("task count")?;

    let mut records = Vec::with_capacity(total);
    for task in 0..total {
        let record = parse_record(&mut reader).with_context(|| format!("task {task}"))?;
        records.push(record);
    }

    if !reader.is_exhausted() {
        bail!("trailing data after {total} task records");
    }
    Ok(records)
}

fn parse_record(reader: &mut TokenReader<'_>) -> Result<TaskRecord> {
    let phase: f64 = reader.next("phase")?;
    let relative_deadline: f64 = reader.next("deadline")?;
    let criticality_lvl: usize = reader.next("criticality level")?;
    if criticality_lvl >= MAX_CRIT_LEVELS {
        bail!("criticality level {criticality_lvl} out of range 0..{MAX_CRIT_LEVELS}");
    }

    let mut wcet = [0.0; MAX_CRIT_LEVELS];
    for (level, slot) in wcet.iter_mut().enumerate() {
        *slot = reader.next(&format!("WCET at level {level}"))?;
    }

    Ok(TaskRecord { phase, relative_deadline, criticality_lvl, wcet })
}

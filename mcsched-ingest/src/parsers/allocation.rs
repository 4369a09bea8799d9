//! Task-to-core allocation parser (`input_allocation.txt`).
//!
//! One `task_index core_index` pair per task, in any order; every task must
//! be assigned exactly once.

use anyhow::{Result, bail};

use super::TokenReader;

pub fn parse_allocation(text: &str, total_tasks: usize) -> Result<Vec<usize>> {
    let mut reader = TokenReader::new(text);
    let mut cores: Vec<Option<usize>> = vec![None; total_tasks];

    for _ in 0..total_tasks {
        let task: usize = reader.next("task index")?;
        let core: usize = reader.next("core index")?;
        if task >= total_tasks {
            bail!("task index {task} out of range 0..{total_tasks}");
        }
        if cores[task].replace(core).is_some() {
            bail!("task {task} allocated twice");
        }
    }

    if !reader.is_exhausted() {
        bail!("trailing data after {total_tasks} allocation entries");
    }

    cores
        .into_iter()
        .enumerate()
        .map(|(task, core)| match core {
            Some(core) => Ok(core),
            None => bail!("task {task} has no core allocation"),
        })
        .collect()
}

use mcsched_core::config::MAX_CRIT_LEVELS;
use mcsched_core::platform::CoreParams;
use mcsched_core::task::TaskSet;
use serde::{Deserialize, Serialize};

/// One task as read from the task-list file, before allocation and sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub phase: f64,
    pub relative_deadline: f64,
    pub criticality_lvl: usize,
    pub wcet: [f64; MAX_CRIT_LEVELS],
}

/// Everything the simulator needs: the frozen task set (allocated, sorted,
/// with execution traces attached) and the per-core EDF-VD parameters.
#[derive(Debug, Clone)]
pub struct Workload {
    pub task_set: TaskSet,
    pub core_params: Vec<CoreParams>,
}

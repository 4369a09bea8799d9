//! Offline EDF-VD schedulability analysis.
//!
//! Per core, the analyzer builds the utilization matrix `U[l][k]` (total
//! utilization at level `k` of the tasks declared at level `l`), checks
//! feasibility on a unit-speed processor, and searches for the deadline-shrink
//! factor `x` and threshold level `k` that admit the task set under EDF-VD.
//! An `x` of zero marks the core unschedulable.
//!
//! The acceptance condition is the standard one: with
//! `U_LO = sum_{j<=k} U[j][j]`, `U_HI_HI = sum_{j>k} U[j][j]` and
//! `U_HI_LO = sum_{j>k} U[j][k]`, take `x = U_HI_LO / (1 - U_LO)` and accept
//! the first `k` with `x * U_LO + U_HI_HI <= 1`.

use crate::config::MAX_CRIT_LEVELS;
use crate::task::TaskSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XFactor {
    /// Deadline-shrink factor in `[0, 1]`; zero means unschedulable.
    pub x: f64,
    /// Highest level whose tasks keep their native deadline.
    pub k: usize,
}

impl XFactor {
    pub const UNSCHEDULABLE: XFactor = XFactor { x: 0.0, k: 0 };

    pub fn is_schedulable(&self) -> bool {
        self.x > 0.0
    }
}

/// `U[l][k]` for the tasks pinned to `core_no`.
pub fn utilisation_matrix(tasks: &TaskSet, core_no: usize) -> [[f64; MAX_CRIT_LEVELS]; MAX_CRIT_LEVELS] {
    let mut total = [[0.0; MAX_CRIT_LEVELS]; MAX_CRIT_LEVELS];
    for task in tasks.iter().filter(|t| t.core == core_no) {
        for (k, row) in total[task.criticality_lvl].iter_mut().enumerate() {
            *row += task.util[k];
        }
    }
    total
}

/// EDF-VD feasibility test for one core. Pure; running it twice on the same
/// input yields the same answer.
pub fn check_schedulability(tasks: &TaskSet, core_no: usize) -> XFactor {
    let total = utilisation_matrix(tasks, core_no);

    // Feasibility on a unit-speed processor: at every level l, the work of
    // levels >= l measured at l must fit.
    for level in 0..MAX_CRIT_LEVELS {
        let demand: f64 = (level..MAX_CRIT_LEVELS).map(|j| total[j][level]).sum();
        if demand > 1.0 {
            return XFactor::UNSCHEDULABLE;
        }
    }

    // Plain EDF admits the set when every task fits at its own level.
    let own_level: f64 = (0..MAX_CRIT_LEVELS).map(|l| total[l][l]).sum();
    if own_level <= 1.0 {
        return XFactor { x: 1.0, k: MAX_CRIT_LEVELS - 1 };
    }

    for k in 0..MAX_CRIT_LEVELS - 1 {
        let util_lo: f64 = (0..=k).map(|j| total[j][j]).sum();
        if util_lo > 1.0 {
            continue;
        }

        let util_hi_hi: f64 = (k + 1..MAX_CRIT_LEVELS).map(|j| total[j][j]).sum();
        let util_hi_lo: f64 = (k + 1..MAX_CRIT_LEVELS).map(|j| total[j][k]).sum();

        let x = util_hi_lo / (1.0 - util_lo);
        if x * util_lo + util_hi_hi <= 1.0 {
            return XFactor { x, k };
        }
    }

    XFactor::UNSCHEDULABLE
}

/// Install virtual deadlines on `core_no` for the accepted `(x, k)`: tasks
/// above the threshold get `x * D`, the rest keep `D`.
pub fn set_virtual_deadlines(tasks: &mut TaskSet, core_no: usize, x: f64, k: usize) {
    for task_number in 0..tasks.len() {
        let task = tasks.task_mut(task_number);
        if task.core != core_no {
            continue;
        }
        task.virtual_deadline = if task.criticality_lvl <= k {
            task.relative_deadline
        } else {
            x * task.relative_deadline
        };
    }
}

/// Undo the shrink once the system level has crossed the threshold.
pub fn reset_virtual_deadlines(tasks: &mut TaskSet, core_no: usize, k: usize) {
    for task_number in 0..tasks.len() {
        let task = tasks.task_mut(task_number);
        if task.core == core_no && task.criticality_lvl > k {
            task.virtual_deadline = task.relative_deadline;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn trivial_edf_when_own_level_fits() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [2.0, 2.0], 0),
            Task::new(0.0, 10.0, 1, [3.0, 6.0], 0),
        ])
        .unwrap();

        let xf = check_schedulability(&tasks, 0);
        assert!(close(xf.x, 1.0));
        assert_eq!(xf.k, MAX_CRIT_LEVELS - 1);
    }

    #[test]
    fn edf_vd_shrinks_high_crit_deadlines() {
        // U[0][0] = 0.4, U[1][1] = 0.8, U[1][0] = 0.2:
        // own-level sum 1.2 needs the VD path; x = 0.2 / 0.6 = 1/3,
        // x * 0.4 + 0.8 <= 1 accepts at k = 0.
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0),
        ])
        .unwrap();

        let xf = check_schedulability(&tasks, 0);
        assert!(xf.is_schedulable());
        assert_eq!(xf.k, 0);
        assert!(close(xf.x, 1.0 / 3.0));
    }

    #[test]
    fn infeasible_when_high_level_overflows() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 1, [6.0, 11.0], 0),
        ])
        .unwrap();

        let xf = check_schedulability(&tasks, 0);
        assert!(!xf.is_schedulable());
    }

    #[test]
    fn analysis_only_sees_its_core() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 1, [6.0, 11.0], 1),
            Task::new(0.0, 10.0, 0, [2.0, 2.0], 0),
        ])
        .unwrap();

        assert!(check_schedulability(&tasks, 0).is_schedulable());
        assert!(!check_schedulability(&tasks, 1).is_schedulable());
    }

    #[test]
    fn analysis_is_idempotent() {
        let tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0),
        ])
        .unwrap();

        assert_eq!(check_schedulability(&tasks, 0), check_schedulability(&tasks, 0));
    }

    #[test]
    fn virtual_deadlines_set_and_reset() {
        let mut tasks = TaskSet::new(vec![
            Task::new(0.0, 10.0, 0, [4.0, 4.0], 0),
            Task::new(0.0, 10.0, 1, [2.0, 8.0], 0),
        ])
        .unwrap();

        set_virtual_deadlines(&mut tasks, 0, 0.5, 0);
        assert_eq!(tasks.task(0).virtual_deadline, 10.0);
        assert_eq!(tasks.task(1).virtual_deadline, 5.0);

        reset_virtual_deadlines(&mut tasks, 0, 0);
        assert_eq!(tasks.task(1).virtual_deadline, 10.0);
    }
}

//! mcsched-core: the event-driven mixed-criticality EDF-VD scheduling kernel.
//!
//! The kernel simulates a partitioned multi-core platform running EDF-VD with
//! job discard and slack reclamation. Inputs (the frozen task set and per-core
//! parameters) come from an external provider; scheduling events flow out
//! through a [`trace::TraceSink`].

pub mod config;
pub mod decision;
pub mod job;
pub mod platform;
pub mod queue;
pub mod reclaim;
pub mod schedulability;
pub mod scheduler;
pub mod slack;
pub mod stats;
pub mod task;
pub mod time;
pub mod trace;

pub use config::{FREQUENCY_TABLE, HIGH, LOW, MAX_CRIT_LEVELS};
pub use decision::{DecisionKind, DecisionPoint, find_decision_point};
pub use job::Job;
pub use platform::{Core, CoreParams, CoreState, Processor};
pub use queue::{DiscardedQueue, ReadyQueue};
pub use reclaim::accommodate_discarded_jobs;
pub use schedulability::{
    XFactor, check_schedulability, reset_virtual_deadlines, set_virtual_deadlines,
    utilisation_matrix,
};
pub use scheduler::{SimOutcome, Simulation};
pub use slack::find_max_slack;
pub use stats::{CoreStats, SimStats};
pub use task::{Task, TaskSet};
pub use time::{TIME_EPS, hyperperiod};
pub use trace::{MemorySink, NullSink, TraceEvent, TraceSink};

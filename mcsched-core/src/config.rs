//! Compile-time model constants.

/// Number of criticality levels in the mixed-criticality model.
///
/// WCET vectors, utilization vectors and the utilization matrix of the
/// schedulability analyzer are all indexed by `0..MAX_CRIT_LEVELS`. The system
/// criticality level saturates at `MAX_CRIT_LEVELS - 1`.
pub const MAX_CRIT_LEVELS: usize = 2;

/// The lowest criticality level.
pub const LOW: usize = 0;

/// The highest criticality level.
pub const HIGH: usize = MAX_CRIT_LEVELS - 1;

/// Frequency table of the simulated platform, lowest to highest, as a fraction
/// of full speed. Cores run at full frequency; the table is configuration
/// surface for platform descriptions.
pub const FREQUENCY_TABLE: [f64; 5] = [0.5, 0.6, 0.75, 0.9, 1.0];

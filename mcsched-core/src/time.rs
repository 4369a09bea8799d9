//! Simulated-time utilities: epsilon comparison and exact hyperperiod.
//!
//! Simulated time is a nondecreasing `f64`. Wherever the scheduling protocol
//! compares times for equality (budget exhaustion, expired deadlines) it goes
//! through [`TIME_EPS`]. The hyperperiod is computed on an integer milli-tick
//! grid so the LCM is exact instead of a subtraction-based gcd on doubles.

use anyhow::{Result, bail};

/// Tolerance for simulated-time equality.
pub const TIME_EPS: f64 = 1e-9;

/// Ticks per simulated time unit for the hyperperiod computation (ms-level
/// fixed point). Periods must sit on this grid.
const TICKS_PER_UNIT: f64 = 1_000.0;

/// `a == b` within [`TIME_EPS`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPS
}

/// `a <= b` within [`TIME_EPS`].
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + TIME_EPS
}

fn gcd(a: u128, b: u128) -> u128 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn to_ticks(period: f64) -> Result<u128> {
    let scaled = period * TICKS_PER_UNIT;
    let ticks = scaled.round();
    if ticks < 1.0 || (scaled - ticks).abs() > 1e-6 {
        bail!("period {period} is not representable on the {TICKS_PER_UNIT}-ticks-per-unit grid");
    }
    Ok(ticks as u128)
}

/// LCM of all task periods, the natural termination horizon of a periodic
/// schedule.
pub fn hyperperiod(periods: &[f64]) -> Result<f64> {
    let mut lcm: u128 = 1;
    for &period in periods {
        let ticks = to_ticks(period)?;
        lcm = lcm / gcd(lcm, ticks) * ticks;
    }
    Ok(lcm as f64 / TICKS_PER_UNIT)
}

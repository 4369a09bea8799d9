//! Platform configuration parser (`input_cores.txt`).
//!
//! One `x_factor threshold_level` pair per core; the number of pairs defines
//! the number of cores. An `x_factor` of zero declares the core
//! unschedulable, forcing it to shut down.

use anyhow::{Result, bail};
use mcsched_core::config::MAX_CRIT_LEVELS;
use mcsched_core::platform::CoreParams;

use super::TokenReader;

pub fn parse_core_config(text: &str) -> Result<Vec<CoreParams>> {
    let mut reader = TokenReader::new(text);
    let mut params = Vec::new();

    while !reader.is_exhausted() {
        let x_factor: f64 = reader.next("x factor")?;
        let threshold_crit_lvl: usize = reader.next("threshold level")?;
        if !(0.0..=1.0).contains(&x_factor) {
            bail!("core {}: x factor {x_factor} outside [0, 1]", params.len());
        }
        if threshold_crit_lvl >= MAX_CRIT_LEVELS {
            bail!(
                "core {}: threshold level {threshold_crit_lvl} out of range 0..{MAX_CRIT_LEVELS}",
                params.len()
            );
        }
        params.push(CoreParams { x_factor, threshold_crit_lvl });
    }

    if params.is_empty() {
        bail!("platform configuration defines no cores");
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_pair_per_core() {
        let params = parse_core_config("0.5 0\n1.0 1\n").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], CoreParams { x_factor: 0.5, threshold_crit_lvl: 0 });
        assert_eq!(params[1], CoreParams { x_factor: 1.0, threshold_crit_lvl: 1 });
    }

    #[test]
    fn zero_x_factor_is_allowed() {
        let params = parse_core_config("0 0\n").unwrap();
        assert_eq!(params[0].x_factor, 0.0);
    }

    #[test]
    fn rejects_x_factor_above_one() {
        assert!(parse_core_config("1.5 0\n").is_err());
    }

    #[test]
    fn rejects_empty_config() {
        assert!(parse_core_config("").is_err());
    }
}

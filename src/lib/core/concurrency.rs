use anyhow::{Error, Result};
use log::{error, warn};

/// Validate and normalize a requested CPU count.
///
/// Requests above the number of logical CPUs are capped.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    let available = num_cpus::get();
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(Error::msg("Too few threads selected. Min 1"))
    } else if desired > available {
        warn!(
            "Specified {} threads but only {} are available, using {}",
            desired, available, available
        );
        Ok(available)
    } else {
        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_threads() {
        assert!(determine_allowed_cpus(0).is_err());
    }

    #[test]
    fn caps_to_available_cpus() {
        let available = num_cpus::get();
        assert_eq!(determine_allowed_cpus(1).unwrap(), 1);
        assert_eq!(determine_allowed_cpus(available + 8).unwrap(), available);
    }
}

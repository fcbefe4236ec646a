pub mod logger;

/// Converts a duration given in (possibly fractional) seconds, rejecting
/// negative and non-finite values
pub fn duration_from_secs(secs: f64) -> anyhow::Result<std::time::Duration> {
    std::time::Duration::try_from_secs_f64(secs)
        .map_err(|e| anyhow::anyhow!("Invalid duration of {} seconds: {}", secs, e))
}

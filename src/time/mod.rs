pub mod timeunit;

/// Wall-clock time in epoch milliseconds, the unit the provisioner stamps records with.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

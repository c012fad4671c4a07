pub mod epoch_millis {
    use chrono::{TimeZone, Utc};
    use serde::Serializer;

    /// Writes epoch milliseconds as an RFC 3339 timestamp.
    pub fn serialize<S>(millis: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let timestamp = Utc.timestamp_millis(*millis).to_rfc3339();
        serializer.serialize_str(timestamp.as_str())
    }
}

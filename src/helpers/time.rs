use chrono::{SecondsFormat, Utc};

/// Second-precision UTC timestamp with a trailing `Z`, the format stamped
/// into `issued_at`.
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole days in `span`, rounded towards positive infinity.
pub fn ceil_days(span: Duration) -> i64 {
    let days = span.num_days();
    if span > Duration::days(days) {
        days + 1
    } else {
        days
    }
}

//! Time-based invalidation of cached lists.

use chrono::{DateTime, Duration, Utc};

use crate::config::DEFAULT_STALE_AFTER_MINUTES;

/// Stale iff there is no timestamp, or it is more than `max_age` old.
pub fn is_stale(last_refresh: Option<DateTime<Utc>>, now: DateTime<Utc>, max_age: Duration) -> bool {
    match last_refresh {
        Some(ts) => now - ts > max_age,
        None => true,
    }
}

/// Human-readable age of a cached list, e.g. "5m ago".
pub fn age_display(last_refresh: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = last_refresh else {
        return "never".to_string();
    };

    let minutes = (now - ts).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub max_age: Duration,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::minutes(DEFAULT_STALE_AFTER_MINUTES),
        }
    }
}

impl StalenessPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn is_stale(&self, last_refresh: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        is_stale(last_refresh, now, self.max_age)
    }
}

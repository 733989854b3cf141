use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub policy: BookingPolicy,
}

/// Business rules for the reservation engine, resolved once at startup so
/// tests can run with varied values instead of ambient globals.
#[derive(Clone, Copy, Debug)]
pub struct BookingPolicy {
    /// How far ahead a reservation date may lie, in days.
    pub max_advance_days: i64,
    pub min_duration_minutes: i64,
    /// Lead time before start after which a booking can no longer be modified.
    pub update_cutoff_hours: i64,
    /// Lead time before start after which a customer can no longer cancel.
    pub cancel_cutoff_hours: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_advance_days: 30,
            min_duration_minutes: 60,
            update_cutoff_hours: 1,
            cancel_cutoff_hours: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = BookingPolicy::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "turfbook.db".to_string()),
            policy: BookingPolicy {
                max_advance_days: env_i64("MAX_ADVANCE_DAYS", defaults.max_advance_days),
                min_duration_minutes: env_i64(
                    "MIN_DURATION_MINUTES",
                    defaults.min_duration_minutes,
                ),
                update_cutoff_hours: env_i64("UPDATE_CUTOFF_HOURS", defaults.update_cutoff_hours),
                cancel_cutoff_hours: env_i64("CANCEL_CUTOFF_HOURS", defaults.cancel_cutoff_hours),
            },
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

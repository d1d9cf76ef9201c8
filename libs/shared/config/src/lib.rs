use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub server_port: u16,
    pub scheduling: SchedulingConfig,
}

const MINUTES_PER_DAY: i64 = 24 * 60;
const MAX_CANCELLATION_LEAD_HOURS: i64 = 24 * 365;
const MAX_STREAK_DAYS: u32 = 3650;

/// Clinic-wide scheduling and tracking rules.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingConfig {
    pub work_day_start: NaiveTime,
    pub work_day_end: NaiveTime,
    pub slot_duration_minutes: i64,
    pub cancellation_lead_hours: i64,
    pub min_appointment_minutes: i64,
    pub max_appointment_minutes: i64,
    pub streak_max_days: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            work_day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_duration_minutes: 60,
            cancellation_lead_hours: 24,
            min_appointment_minutes: 15,
            max_appointment_minutes: 240,
            streak_max_days: 365,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            work_day_start: time_var("WORK_DAY_START", defaults.work_day_start),
            work_day_end: time_var("WORK_DAY_END", defaults.work_day_end),
            slot_duration_minutes: bounded_var("SLOT_DURATION_MINUTES", defaults.slot_duration_minutes, 1, MINUTES_PER_DAY),
            cancellation_lead_hours: bounded_var("CANCELLATION_LEAD_HOURS", defaults.cancellation_lead_hours, 0, MAX_CANCELLATION_LEAD_HOURS),
            min_appointment_minutes: bounded_var("MIN_APPOINTMENT_MINUTES", defaults.min_appointment_minutes, 1, MINUTES_PER_DAY),
            max_appointment_minutes: bounded_var("MAX_APPOINTMENT_MINUTES", defaults.max_appointment_minutes, 1, MINUTES_PER_DAY),
            streak_max_days: bounded_var("STREAK_MAX_DAYS", defaults.streak_max_days, 1, MAX_STREAK_DAYS),
        };

        if config.work_day_start >= config.work_day_end {
            warn!(
                "WORK_DAY_START ({}) is not before WORK_DAY_END ({}), no slots will be offered",
                config.work_day_start, config.work_day_end
            );
        }

        config
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            server_port: parsed_var("SERVER_PORT", 3000),
            scheduling: SchedulingConfig::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn bounded_var<T>(name: &str, default: T, min: T, max: T) -> T
where
    T: FromStr + std::fmt::Display + PartialOrd + Copy,
{
    clamp_setting(name, parsed_var(name, default), min, max)
}

/// Pulls an out-of-range setting back into `[min, max]`.
fn clamp_setting<T>(name: &str, value: T, min: T, max: T) -> T
where
    T: std::fmt::Display + PartialOrd + Copy,
{
    if value < min {
        warn!("{} ({}) is below {}, using {}", name, value, min, min);
        min
    } else if value > max {
        warn!("{} ({}) is above {}, using {}", name, value, max, max);
        max
    } else {
        value
    }
}

// Accepts "HH:MM" or "HH:MM:SS".
fn time_var(name: &str, default: NaiveTime) -> NaiveTime {
    match env::var(name) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
            .unwrap_or_else(|_| {
                warn!("{} has invalid time '{}', using default {}", name, raw, default);
                default
            }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheduling_rules() {
        let rules = SchedulingConfig::default();

        assert_eq!(rules.work_day_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(rules.work_day_end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(rules.slot_duration_minutes, 60);
        assert_eq!(rules.cancellation_lead_hours, 24);
        assert_eq!(rules.streak_max_days, 365);
    }

    #[test]
    fn test_out_of_range_settings_are_clamped() {
        assert_eq!(
            clamp_setting("CANCELLATION_LEAD_HOURS", i64::MAX, 0, MAX_CANCELLATION_LEAD_HOURS),
            MAX_CANCELLATION_LEAD_HOURS
        );
        assert_eq!(clamp_setting("CANCELLATION_LEAD_HOURS", -5, 0, MAX_CANCELLATION_LEAD_HOURS), 0);
        assert_eq!(clamp_setting("STREAK_MAX_DAYS", u32::MAX, 1, MAX_STREAK_DAYS), MAX_STREAK_DAYS);
        assert_eq!(clamp_setting("STREAK_MAX_DAYS", 0, 1, MAX_STREAK_DAYS), 1);
        assert_eq!(clamp_setting("SLOT_DURATION_MINUTES", 45, 1, MINUTES_PER_DAY), 45);
    }

    #[test]
    fn test_is_configured_requires_supabase_values() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            server_port: 3000,
            scheduling: SchedulingConfig::default(),
        };
        assert!(config.is_configured());

        config.supabase_jwt_secret.clear();
        assert!(!config.is_configured());
    }
}

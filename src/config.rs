use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;

use crate::domain::shared::{FeeSchedule, Money};

/// Longest audit retention accepted; keeps the purge cutoff inside the calendar
pub const MAX_AUDIT_RETENTION_DAYS: i64 = 36_500;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub fees: FeeSchedule,
    pub profile_cache_ttl: Duration,
    pub audit_retention_days: i64,
    pub log_cleanup_interval: Duration,
    pub outbox_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 9090,
            fees: FeeSchedule::default(),
            profile_cache_ttl: Duration::from_secs(300),
            audit_retention_days: 30,
            log_cleanup_interval: Duration::from_secs(86_400),
            outbox_poll_interval: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Unset variables keep their default; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        let fees = defaults.fees;

        let config = Self {
            http_port: parsed("HTTP_PORT", defaults.http_port)?,
            fees: FeeSchedule {
                membership_annual: fee("MEMBERSHIP_ANNUAL_FEE", fees.membership_annual)?,
                membership_lifetime: fee("MEMBERSHIP_LIFETIME_FEE", fees.membership_lifetime)?,
                syndicate: fee("SYNDICATE_FEE", fees.syndicate)?,
                certificate_graduation: fee("CERTIFICATE_GRADUATION_FEE", fees.certificate_graduation)?,
                certificate_transcript: fee("CERTIFICATE_TRANSCRIPT_FEE", fees.certificate_transcript)?,
                certificate_enrollment: fee("CERTIFICATE_ENROLLMENT_FEE", fees.certificate_enrollment)?,
            },
            profile_cache_ttl: Duration::from_secs(parsed(
                "PROFILE_CACHE_TTL_SECS",
                defaults.profile_cache_ttl.as_secs(),
            )?),
            audit_retention_days: parsed("AUDIT_RETENTION_DAYS", defaults.audit_retention_days)?,
            log_cleanup_interval: Duration::from_secs(parsed(
                "LOG_CLEANUP_INTERVAL_SECS",
                defaults.log_cleanup_interval.as_secs(),
            )?),
            outbox_poll_interval: Duration::from_millis(parsed(
                "OUTBOX_POLL_INTERVAL_MS",
                defaults.outbox_poll_interval.as_millis() as u64,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the background actors cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_AUDIT_RETENTION_DAYS).contains(&self.audit_retention_days) {
            bail!(
                "AUDIT_RETENTION_DAYS must be between 1 and {MAX_AUDIT_RETENTION_DAYS}, got {}",
                self.audit_retention_days
            );
        }
        if self.log_cleanup_interval.is_zero() {
            bail!("LOG_CLEANUP_INTERVAL_SECS must be greater than zero");
        }
        if self.outbox_poll_interval.is_zero() {
            bail!("OUTBOX_POLL_INTERVAL_MS must be greater than zero");
        }
        Ok(())
    }
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{name} must be a valid number, got {raw:?}"))
}

fn fee(name: &str, default: Money) -> Result<Money> {
    match env::var(name) {
        Ok(raw) => parse_fee(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_fee(name: &str, raw: &str) -> Result<Money> {
    let amount: Decimal = parse_value(name, raw)?;
    Money::new(amount).with_context(|| format!("{name} must not be negative"))
}

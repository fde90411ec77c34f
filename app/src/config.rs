use anyhow::{Context, Result};
use std::{ops::Deref, str::FromStr, sync::Arc, time::Duration};

const DEFAULT_COUNTDOWN: Duration = Duration::from_millis(5000);
const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(16);
const DEFAULT_RETENTION: Duration = Duration::from_millis(15000);
const DEFAULT_WINNING_SCORE: u32 = 5;
const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug)]
pub struct ConfigInner {
    /// Delay between pairing and the first tick.
    pub countdown: Duration,
    pub tick_period: Duration,
    /// How long a finished match stays queryable.
    pub retention: Duration,
    pub winning_score: u32,
    pub history_limit: usize,
}

#[derive(Clone, Debug)]
pub struct Config(Arc<ConfigInner>);

impl ConfigInner {
    /// Rejects values the timers and the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.tick_period.is_zero(), "tick period must be positive");
        anyhow::ensure!(self.winning_score > 0, "winning score must be positive");
        Ok(())
    }
}

impl Config {
    pub fn new(inner: ConfigInner) -> Result<Self> {
        inner.validate()?;
        Ok(Self(Arc::new(inner)))
    }

    pub fn from_env() -> Result<Config> {
        // A missing .env file is fine, the process environment still applies.
        dotenvy::dotenv().ok();

        let v = ConfigInner {
            countdown: env_millis("PONG_COUNTDOWN_MS")?.unwrap_or(DEFAULT_COUNTDOWN),
            tick_period: env_millis("PONG_TICK_MS")?.unwrap_or(DEFAULT_TICK_PERIOD),
            retention: env_millis("PONG_RETENTION_MS")?.unwrap_or(DEFAULT_RETENTION),
            winning_score: env_parse("PONG_WINNING_SCORE")?.unwrap_or(DEFAULT_WINNING_SCORE),
            history_limit: env_parse("PONG_HISTORY_LIMIT")?.unwrap_or(DEFAULT_HISTORY_LIMIT),
        };

        Self::new(v).context("invalid PONG_* settings")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self(Arc::new(ConfigInner {
            countdown: DEFAULT_COUNTDOWN,
            tick_period: DEFAULT_TICK_PERIOD,
            retention: DEFAULT_RETENTION,
            winning_score: DEFAULT_WINNING_SCORE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }))
    }
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} is not a valid number: {raw:?}")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("{key} could not be read")),
    }
}

fn env_millis(key: &str) -> Result<Option<Duration>> {
    Ok(env_parse::<u64>(key)?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_timings() {
        let config = Config::default();
        assert_eq!(config.countdown, Duration::from_secs(5));
        assert_eq!(config.tick_period, Duration::from_millis(16));
        assert_eq!(config.retention, Duration::from_secs(15));
        assert_eq!(config.winning_score, 5);
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn zero_tick_period_or_score_is_rejected() {
        let inner = |tick_ms, winning_score| ConfigInner {
            countdown: DEFAULT_COUNTDOWN,
            tick_period: Duration::from_millis(tick_ms),
            retention: DEFAULT_RETENTION,
            winning_score,
            history_limit: DEFAULT_HISTORY_LIMIT,
        };
        assert!(Config::new(inner(0, 5)).is_err());
        assert!(Config::new(inner(16, 0)).is_err());
        assert_eq!(Config::new(inner(16, 3)).unwrap().winning_score, 3);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn missing_variables_read_as_none() {
        let value: Option<u32> = env_parse("PONG_TEST_SURELY_UNSET_VARIABLE").unwrap();
        assert!(value.is_none());
    }
}

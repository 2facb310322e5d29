use std::env;
use std::time::Duration;

use crate::protection::crypto;

const DEV_PROTECTION_SECRET: &str = "csintel-development-secret";

/// Runtime settings, read once at startup from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub ai: Option<AiCredentials>,
    pub ai_deployment: String,
    pub protection_secret: String,
    pub protection_iterations: u32,
    pub market_cache_ttl: Duration,
    pub ingestion_delay: Duration,
    pub worker_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct AiCredentials {
    pub endpoint: String,
    pub api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let ai = match (env::var("AZURE_OPENAI_ENDPOINT"), env::var("AZURE_OPENAI_API_KEY")) {
            (Ok(endpoint), Ok(api_key)) if !endpoint.is_empty() && !api_key.is_empty() => {
                Some(AiCredentials { endpoint, api_key })
            }
            _ => {
                tracing::info!("AZURE_OPENAI_ENDPOINT or AZURE_OPENAI_API_KEY not set; AI answers will be simulated");
                None
            }
        };

        let protection_secret = env::var("DATA_PROTECTION_SECRET").unwrap_or_else(|_| {
            tracing::warn!("DATA_PROTECTION_SECRET not set; using the development secret");
            DEV_PROTECTION_SECRET.to_string()
        });

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string()),
            ai,
            ai_deployment: env::var("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|_| "gpt-4o".to_string()),
            protection_secret,
            protection_iterations: iterations_from(env_u64(
                "DATA_PROTECTION_ITERATIONS",
                u64::from(crypto::DEFAULT_ITERATIONS),
            )),
            market_cache_ttl: Duration::from_secs(env_u64("MARKET_CACHE_TTL_SECS", 300)),
            ingestion_delay: Duration::from_millis(env_u64("INGESTION_DELAY_MS", 250)),
            worker_interval: interval_from_minutes(env_u64("WORKER_INTERVAL_MINS", 60)),
        }
    }

    /// Settings for tests: in-memory database, no AI credentials, no artificial delays.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            ai: None,
            ai_deployment: "gpt-4o".to_string(),
            protection_secret: DEV_PROTECTION_SECRET.to_string(),
            protection_iterations: 1_000,
            market_cache_ttl: Duration::from_secs(300),
            ingestion_delay: Duration::ZERO,
            worker_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Longest worker interval accepted: one week.
const MAX_WORKER_INTERVAL_MINS: u64 = 7 * 24 * 60;

/// Worker interval in minutes, clamped to between one minute and one week.
fn interval_from_minutes(mins: u64) -> Duration {
    let clamped = mins.clamp(1, MAX_WORKER_INTERVAL_MINS);
    if clamped != mins {
        tracing::warn!("WORKER_INTERVAL_MINS={} is out of range; using {}", mins, clamped);
    }
    Duration::from_secs(clamped.saturating_mul(60))
}

/// PBKDF2 rounds; zero or anything past `u32::MAX` falls back to the default.
fn iterations_from(raw: u64) -> u32 {
    match u32::try_from(raw) {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(
                "DATA_PROTECTION_ITERATIONS={} is out of range; using {}",
                raw,
                crypto::DEFAULT_ITERATIONS
            );
            crypto::DEFAULT_ITERATIONS
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{} is not a number ({:?}); using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_interval_is_clamped() {
        assert_eq!(interval_from_minutes(0), Duration::from_secs(60));
        assert_eq!(interval_from_minutes(90), Duration::from_secs(90 * 60));
        assert_eq!(interval_from_minutes(u64::MAX), Duration::from_secs(MAX_WORKER_INTERVAL_MINS * 60));
    }

    #[test]
    fn iterations_fall_back_when_out_of_range() {
        assert_eq!(iterations_from(5_000), 5_000);
        assert_eq!(iterations_from(0), crypto::DEFAULT_ITERATIONS);
        assert_eq!(iterations_from(u64::from(u32::MAX) + 1), crypto::DEFAULT_ITERATIONS);
    }
}

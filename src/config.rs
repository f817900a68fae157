use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{config_error, Error};

#[derive(Clone, Debug)]
pub struct Config {
    pub google_maps_api_base: String,
    pub google_maps_api_key: String,
    pub embeddings_api_base: String,
    pub embeddings_api_key: String,
    pub embeddings_model: String,
    pub embeddings_batch_size: usize,
    pub index_dir: PathBuf,
    pub provider_timeout: Duration,
    pub addr: SocketAddr,
}

impl Config {
    /// Reads configuration from the environment, after loading `.env` if present.
    #[tracing::instrument(name = "Config::from_env")]
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let host = var_or("HOST", "0.0.0.0");
        let port: u16 = parse_var("PORT", 8000)?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| config_error(format!("invalid listen address {}:{}", host, port)))?;

        Ok(Self {
            google_maps_api_base: var_or("GOOGLE_MAPS_API_BASE", "maps.googleapis.com"),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")?,
            embeddings_api_base: var_or("EMBEDDINGS_API_BASE", "https://api.openai.com/v1"),
            embeddings_api_key: env::var("EMBEDDINGS_API_KEY")?,
            embeddings_model: var_or("EMBEDDINGS_MODEL", "text-embedding-3-small"),
            embeddings_batch_size: parse_var("EMBEDDINGS_BATCH_SIZE", 96usize)?.max(1),
            index_dir: PathBuf::from(var_or("INDEX_DIR", ".")),
            provider_timeout: Duration::from_secs(parse_var("PROVIDER_TIMEOUT_SECS", 10)?),
            addr,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| config_error(format!("{} has invalid value {:?}", key, raw))),
        _ => Ok(default),
    }
}

#[test]
fn parses_numeric_vars() {
    env::set_var("ROADSTOP_TEST_PORT", "9100");
    env::set_var("ROADSTOP_TEST_BAD", "ninety");

    assert_eq!(parse_var::<u16>("ROADSTOP_TEST_PORT", 1).unwrap(), 9100);
    assert_eq!(parse_var::<u16>("ROADSTOP_TEST_UNSET", 7).unwrap(), 7);
    assert_eq!(
        parse_var::<u64>("ROADSTOP_TEST_BAD", 1).unwrap_err().code,
        crate::error::CONFIGURATION
    );
}

#[test]
fn blank_vars_fall_back() {
    env::set_var("ROADSTOP_TEST_BLANK", "  ");
    assert_eq!(var_or("ROADSTOP_TEST_BLANK", "fallback"), "fallback");
}

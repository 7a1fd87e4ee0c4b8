use log::{info, warn};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};

pub struct Config {
    pub bind: String,
    /// Directory of the sled database. `None` runs on a temporary database.
    pub db_path: Option<PathBuf>,
    pub workers: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self, String> {
        Ok(Self {
            bind: try_load("FILMORATE_BIND", "127.0.0.1:8080")?,
            db_path: try_load_optional("FILMORATE_DB_PATH")?,
            workers: try_load_optional("FILMORATE_WORKERS")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        format!("invalid {key}: {e}")
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    parse(key, &value)
}

fn try_load_optional<T: FromStr>(key: &str) -> Result<Option<T>, String>
where
    T::Err: Display,
{
    match var(key) {
        Some(value) => parse(key, &value).map(Some),
        None => {
            info!("{key} not set");
            Ok(None)
        }
    }
}

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scholar::DEFAULT_PUB_LIMIT;

const DEFAULT_USER_AGENT: &str = "scholar-scrape/0.1";
const DATABASE_FILE: &str = "publications.db";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub pub_limit: usize,
    pub user_agent: String,
    /// Upper bound the server puts on a whole scrape; unset means wait for the fetch.
    pub fetch_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = var("SCHOLAR_SCRAPE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home_or_default(&var).join(".scholar-scrape"));

        let pub_limit = parse_var(&var, "SCHOLAR_PUB_LIMIT").unwrap_or(DEFAULT_PUB_LIMIT);
        let user_agent = var("SCHOLAR_USER_AGENT")
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let fetch_timeout = parse_var::<u64, _>(&var, "SCHOLAR_FETCH_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            data_dir,
            pub_limit,
            user_agent,
            fetch_timeout,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_var<T, F>(var: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}

fn home_or_default<F>(var: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("HOME", "/home/ada")]);
        assert_eq!(cfg.data_dir, PathBuf::from("/home/ada/.scholar-scrape"));
        assert_eq!(cfg.database_path(), PathBuf::from("/home/ada/.scholar-scrape/publications.db"));
        assert_eq!(cfg.pub_limit, 5);
        assert_eq!(cfg.user_agent, "scholar-scrape/0.1");
        assert_eq!(cfg.fetch_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("SCHOLAR_SCRAPE_DATA_DIR", "/tmp/scrape"),
            ("SCHOLAR_PUB_LIMIT", " 20 "),
            ("SCHOLAR_USER_AGENT", "Mozilla/5.0"),
            ("SCHOLAR_FETCH_TIMEOUT_SECS", "30"),
        ]);
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/scrape"));
        assert_eq!(cfg.pub_limit, 20);
        assert_eq!(cfg.user_agent, "Mozilla/5.0");
        assert_eq!(cfg.fetch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let cfg = config(&[
            ("SCHOLAR_PUB_LIMIT", "five"),
            ("SCHOLAR_FETCH_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(cfg.pub_limit, 5);
        assert_eq!(cfg.fetch_timeout, None);
    }
}

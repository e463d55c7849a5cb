use std::net::SocketAddr;
use std::str::FromStr;

use crate::core::TodoError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How complete/delete treat an id with no matching row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTaskPolicy {
    /// Redirect as if the statement had matched.
    #[default]
    Ignore,
    /// Answer 404.
    NotFound,
}

impl MissingTaskPolicy {
    pub fn check(self, id: i64, found: bool) -> Result<(), TodoError> {
        match (self, found) {
            (MissingTaskPolicy::NotFound, false) => Err(TodoError::NotFound(id)),
            _ => Ok(()),
        }
    }
}

impl FromStr for MissingTaskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(MissingTaskPolicy::Ignore),
            "not_found" | "not-found" | "404" => Ok(MissingTaskPolicy::NotFound),
            other => Err(format!("expected 'ignore' or 'not_found', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    pub max_connections: u32,
    pub missing_task: MissingTaskPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            missing_task: MissingTaskPolicy::default(),
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, TodoError> {
        dotenv_loaded(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TodoError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            addr: parse_var(&lookup, "TODO_ADDR")?.unwrap_or(defaults.addr),
            max_connections: match parse_var::<u32>(&lookup, "TODO_MAX_CONNECTIONS")? {
                Some(0) => {
                    return Err(TodoError::Config {
                        var: "TODO_MAX_CONNECTIONS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Some(n) => n,
                None => defaults.max_connections,
            },
            missing_task: parse_var(&lookup, "TODO_MISSING_TASK")?.unwrap_or(defaults.missing_task),
        })
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn dotenv_loaded<T>(result: dotenvy::Result<T>) -> Result<(), TodoError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(TodoError::Config {
            var: ".env",
            reason: e.to_string(),
        }),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, TodoError>
where
    T: FromStr,
    T::Err: ToString,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| TodoError::Config {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.addr, DEFAULT_ADDR.parse().unwrap());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.missing_task, MissingTaskPolicy::Ignore);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite:///var/lib/todos.db"),
            ("TODO_ADDR", "0.0.0.0:8080"),
            ("TODO_MAX_CONNECTIONS", "12"),
            ("TODO_MISSING_TASK", "not_found"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite:///var/lib/todos.db");
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.missing_task, MissingTaskPolicy::NotFound);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("TODO_ADDR", "not an address")])).unwrap_err();
        assert!(matches!(err, TodoError::Config { var: "TODO_ADDR", .. }));

        let err = Config::from_lookup(lookup(&[("TODO_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, TodoError::Config { var: "TODO_MAX_CONNECTIONS", .. }));

        let err = Config::from_lookup(lookup(&[("TODO_MISSING_TASK", "explode")])).unwrap_err();
        assert!(matches!(err, TodoError::Config { var: "TODO_MISSING_TASK", .. }));
    }

    #[test]
    fn policy_only_fails_missing_rows_when_strict() {
        assert!(MissingTaskPolicy::Ignore.check(3, false).is_ok());
        assert!(MissingTaskPolicy::NotFound.check(3, true).is_ok());
        assert!(matches!(
            MissingTaskPolicy::NotFound.check(3, false),
            Err(TodoError::NotFound(3))
        ));
    }

    #[test]
    fn missing_dotenv_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        assert!(dotenv_loaded(dotenvy::from_path(dir.path().join(".env"))).is_ok());
    }

    #[test]
    fn malformed_dotenv_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "very bacon = yes indeed\n").unwrap();

        let err = dotenv_loaded(dotenvy::from_path(&path)).unwrap_err();
        assert!(matches!(err, TodoError::Config { var: ".env", .. }), "{err}");
    }
}

use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use crate::ConfigurationError;

/// Agent arguments parsed from a whitespace-separated `key=value` string.
///
/// The recognized keys are typed fields; anything else is kept verbatim and
/// can be read back with [`AgentConfig::extra`] or [`AgentConfig::extra_parsed`].
/// When a key appears twice, the last occurrence wins.
///
/// ```
/// use threes_agent::config::AgentConfig;
///
/// let config: AgentConfig = "name=six-tuple alpha=0.003 init=4096,4096 seed=7".parse().unwrap();
/// assert_eq!(config.name.as_deref(), Some("six-tuple"));
/// assert_eq!(config.alpha, Some(0.003));
/// assert_eq!(config.init.as_deref(), Some(&[4096, 4096][..]));
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    pub name: Option<String>,
    pub role: Option<String>,
    pub seed: Option<u64>,
    pub alpha: Option<f32>,
    pub init: Option<Vec<usize>>,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    extras: BTreeMap<String, String>,
}

impl FromStr for AgentConfig {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();
        for pair in s.split_whitespace() {
            let (key, value) = pair
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| ConfigurationError::MalformedArgument(pair.to_owned()))?;
            config.set(key, value)?;
        }
        Ok(config)
    }
}

impl AgentConfig {
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        match key {
            "name" => self.name = Some(value.to_owned()),
            "role" => self.role = Some(value.to_owned()),
            "seed" => self.seed = Some(parse_value(key, value)?),
            "alpha" => {
                let alpha: f32 = parse_value(key, value)?;
                if !alpha.is_finite() || alpha < 0.0 {
                    return Err(invalid_value(key, value));
                }
                self.alpha = Some(alpha);
            }
            "init" => self.init = Some(parse_sizes(value)?),
            "load" => self.load = Some(PathBuf::from(value)),
            "save" => self.save = Some(PathBuf::from(value)),
            _ => {
                self.extras.insert(key.to_owned(), value.to_owned());
            }
        }
        Ok(())
    }

    /// Returns the configured name, or `default` when none was given.
    #[must_use]
    pub fn name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(default)
    }

    /// Returns the raw value of an unrecognized key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// Parses the value of an unrecognized key.
    pub fn extra_parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: FromStr,
    {
        self.extra(key)
            .map(|value| parse_value(key, value))
            .transpose()
    }
}

fn invalid_value(key: &str, value: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigurationError>
where
    T: FromStr,
{
    value.parse().map_err(|_| invalid_value(key, value))
}

/// Parses a comma-separated list of table sizes such as `65536,65536`.
fn parse_sizes(value: &str) -> Result<Vec<usize>, ConfigurationError> {
    let sizes = value
        .split(',')
        .map(|size| {
            let size: i64 = parse_value("init", size.trim())?;
            if size <= 0 {
                return Err(ConfigurationError::NonPositiveSize);
            }
            usize::try_from(size).map_err(|_| invalid_value("init", value))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sizes)
}

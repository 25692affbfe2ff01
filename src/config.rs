use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

pub const DEFAULT_SIM_LENGTH: usize = 10;
pub const DEFAULT_INITIAL_CASH: f64 = 50.0;
pub const DEFAULT_QUOTES_API_URL: &str = "https://api.robinhood.com";
pub const DEFAULT_QUOTE_BATCH_SIZE: usize = 75;

const SETTING_KEYS: [&str; 6] = [
    "SIM_LENGTH",
    "INITIAL_CASH",
    "DATE_OFFSET",
    "RANDOM_SEED",
    "QUOTES_API_URL",
    "QUOTE_BATCH_SIZE",
];

/// A strategy template plus its numeric parameters, e.g. `momentum:lookback=5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub template_id: String,
    pub parameters: HashMap<String, f64>,
}

impl StrategySpec {
    pub fn new(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    /// Random, BuyTheDip and Momentum on yesterday's move, then both ranked
    /// strategies on a five day lookback.
    pub fn default_lineup() -> Vec<Self> {
        vec![
            Self::new("random"),
            Self::new("buy_the_dip"),
            Self::new("momentum"),
            Self::new("buy_the_dip").with_param("lookback", 5.0),
            Self::new("momentum").with_param("lookback", 5.0),
        ]
    }
}

impl FromStr for StrategySpec {
    type Err = anyhow::Error;

    /// Parses `template[:key=value[,key=value...]]`. A bare number after the
    /// colon is taken as the lookback.
    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (template, params) = match raw.split_once(':') {
            Some((template, params)) => (template, Some(params)),
            None => (raw, None),
        };
        let template_id = normalize_template_id(template)
            .ok_or_else(|| anyhow!("Strategy template missing in '{}'", raw))?;

        let mut spec = StrategySpec::new(&template_id);
        for part in params.into_iter().flat_map(|p| p.split(',')) {
            let entry = part.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry.split_once('=').unwrap_or(("lookback", entry));
            let value = value.trim().parse::<f64>().map_err(|_| {
                anyhow!(
                    "Strategy parameter {} must be a number (value: {})",
                    key.trim(),
                    value.trim()
                )
            })?;
            if !value.is_finite() {
                return Err(anyhow!(
                    "Strategy parameter {} must be finite (value: {})",
                    key.trim(),
                    value
                ));
            }
            spec.parameters.insert(key.trim().to_string(), value);
        }
        Ok(spec)
    }
}

fn normalize_template_id(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    match normalized.as_str() {
        "" => None,
        "btfd" | "buythedip" => Some("buy_the_dip".to_string()),
        _ => Some(normalized),
    }
}

/// Everything a single simulation run needs besides market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub sim_length: usize,
    pub initial_cash: f64,
    pub date_offset: usize,
    pub seed: Option<u64>,
    pub strategies: Vec<StrategySpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_length: DEFAULT_SIM_LENGTH,
            initial_cash: DEFAULT_INITIAL_CASH,
            date_offset: 0,
            seed: None,
            strategies: StrategySpec::default_lineup(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub sim_length: usize,
    pub initial_cash: f64,
    pub date_offset: usize,
    pub random_seed: Option<u64>,
    pub quotes_api_url: String,
    pub quote_batch_size: usize,
}

impl SimulationSettings {
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let sim_length = setting_usize(settings, "SIM_LENGTH", DEFAULT_SIM_LENGTH, 1)?;
        let initial_cash = setting_f64(settings, "INITIAL_CASH", DEFAULT_INITIAL_CASH)?;
        if initial_cash <= 0.0 {
            return Err(anyhow!(
                "Setting INITIAL_CASH must be > 0 (value: {})",
                initial_cash
            ));
        }
        let date_offset = setting_usize(settings, "DATE_OFFSET", 0, 0)?;
        let random_seed = optional_setting(settings, "RANDOM_SEED")
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| {
                    anyhow!(
                        "Setting RANDOM_SEED must be a non-negative integer (value: {})",
                        raw
                    )
                })
            })
            .transpose()?;
        let quotes_api_url = optional_setting(settings, "QUOTES_API_URL")
            .unwrap_or(DEFAULT_QUOTES_API_URL)
            .trim_end_matches('/')
            .to_string();
        let quote_batch_size =
            setting_usize(settings, "QUOTE_BATCH_SIZE", DEFAULT_QUOTE_BATCH_SIZE, 1)?;

        Ok(Self {
            sim_length,
            initial_cash,
            date_offset,
            random_seed,
            quotes_api_url,
            quote_batch_size,
        })
    }

    pub fn simulation_config(&self, strategies: Vec<StrategySpec>) -> SimulationConfig {
        SimulationConfig {
            sim_length: self.sim_length,
            initial_cash: self.initial_cash,
            date_offset: self.date_offset,
            seed: self.random_seed,
            strategies,
        }
    }
}

/// Collects the recognised settings from the process environment.
pub fn settings_from_env() -> HashMap<String, String> {
    SETTING_KEYS
        .iter()
        .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
        .collect()
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn setting_f64(settings: &HashMap<String, String>, key: &str, default: f64) -> Result<f64> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("Setting {} must be a number (value: {})", key, raw))?;
    if !value.is_finite() {
        return Err(anyhow!("Setting {} must be finite (value: {})", key, raw));
    }
    Ok(value)
}

fn setting_usize(
    settings: &HashMap<String, String>,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<usize>()
        .map_err(|_| anyhow!("Setting {} must be an integer (value: {})", key, raw))?;
    if value < min {
        return Err(anyhow!(
            "Setting {} must be >= {} (value: {})",
            key,
            min,
            raw
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_settings_are_absent() {
        let parsed = SimulationSettings::from_settings_map(&HashMap::new()).expect("settings");
        assert_eq!(parsed.sim_length, 10);
        assert_eq!(parsed.initial_cash, 50.0);
        assert_eq!(parsed.date_offset, 0);
        assert_eq!(parsed.random_seed, None);
        assert_eq!(parsed.quotes_api_url, DEFAULT_QUOTES_API_URL);
        assert_eq!(parsed.quote_batch_size, 75);
    }

    #[test]
    fn parses_and_validates_settings() {
        let parsed = SimulationSettings::from_settings_map(&settings(&[
            ("SIM_LENGTH", "20"),
            ("INITIAL_CASH", "1000.5"),
            ("DATE_OFFSET", "3"),
            ("RANDOM_SEED", "99"),
            ("QUOTES_API_URL", "http://localhost:8080/"),
        ]))
        .expect("settings");
        assert_eq!(parsed.sim_length, 20);
        assert_eq!(parsed.date_offset, 3);
        assert_eq!(parsed.random_seed, Some(99));
        assert_eq!(parsed.quotes_api_url, "http://localhost:8080");

        assert!(SimulationSettings::from_settings_map(&settings(&[("SIM_LENGTH", "0")])).is_err());
        assert!(
            SimulationSettings::from_settings_map(&settings(&[("INITIAL_CASH", "-1")])).is_err()
        );
        assert!(
            SimulationSettings::from_settings_map(&settings(&[("RANDOM_SEED", "abc")])).is_err()
        );
    }

    #[test]
    fn parses_strategy_specs() {
        let spec: StrategySpec = "random".parse().expect("random");
        assert_eq!(spec, StrategySpec::new("random"));

        let spec: StrategySpec = "BTFD:dip_len=5".parse().expect("btfd");
        assert_eq!(spec.template_id, "buy_the_dip");
        assert_eq!(spec.parameters.get("dip_len"), Some(&5.0));

        let spec: StrategySpec = "momentum:3".parse().expect("momentum");
        assert_eq!(spec.parameters.get("lookback"), Some(&3.0));

        assert!("momentum:lookback=abc".parse::<StrategySpec>().is_err());
        assert!(":5".parse::<StrategySpec>().is_err());
    }
}

use clap::Parser;
use log::info;
use std::collections::HashSet;
use std::env;
use thiserror::Error;

use crate::aggregator::counter::DEFAULT_REPORT_INTERVAL_MS;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not a valid transmitter id")]
    InvalidTransmitterId(String),
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidSetting { name: &'static str, value: String },
}

/// Count Pipsqueak samples per receiver and transmitter and print periodic reports
#[derive(Parser, Debug)]
#[command(name = "tag-counter", version, long_about = None)]
pub struct CounterArgs {
    /// Aggregator host
    pub host: String,

    /// Aggregator solver port
    pub port: u16,

    /// Only count these transmitter ids (decimal, signed 32-bit)
    #[arg(allow_negative_numbers = true)]
    pub ids: Vec<i32>,

    /// Only count this transmitter id, given in hexadecimal (repeatable)
    #[arg(short = 'x', visible_short_alias = 'X', value_name = "HEX", value_parser = parse_hex_id)]
    pub hex_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub host: String,
    pub port: u16,
    /// Empty means every transmitter is counted
    pub transmitters: HashSet<i32>,
    pub report_interval_ms: i64,
    pub connect_timeout_secs: u64,
}

impl CounterConfig {
    /// Build the configuration from process arguments and environment
    ///
    /// Exits with a usage message when the arguments do not parse.
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        let mut config = Self::from_args(CounterArgs::parse());
        config.report_interval_ms = env_setting("REPORT_INTERVAL_MS", DEFAULT_REPORT_INTERVAL_MS)?;
        config.connect_timeout_secs =
            env_setting("CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;

        info!(
            "Aggregator {}:{}, report every {} ms",
            config.host, config.port, config.report_interval_ms
        );
        if !config.transmitters.is_empty() {
            let mut ids: Vec<_> = config.transmitters.iter().collect();
            ids.sort();
            info!("Counting only transmitters {:?}", ids);
        }

        Ok(config)
    }

    pub fn from_args(args: CounterArgs) -> Self {
        let transmitters = args.ids.into_iter().chain(args.hex_ids).collect();

        CounterConfig {
            host: args.host,
            port: args.port,
            transmitters,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn accepts(&self, device_id: i32) -> bool {
        self.transmitters.is_empty() || self.transmitters.contains(&device_id)
    }
}

/// Parse a 32-bit id written in hex, `0x` prefix optional
pub fn parse_hex_id(text: &str) -> Result<i32, ConfigError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .map(|value| value as i32)
        .map_err(|_| ConfigError::InvalidTransmitterId(text.to_string()))
}

/// Read a positive numeric setting from the environment, or fall back to `default`
pub fn env_setting<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(name) {
        Ok(value) => parse_setting(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T: std::str::FromStr + PartialOrd + Default>(
    name: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidSetting {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(list: &[&str]) -> Result<CounterConfig, clap::Error> {
        let argv = std::iter::once("tag-counter").chain(list.iter().copied());
        CounterArgs::try_parse_from(argv).map(CounterConfig::from_args)
    }

    #[test]
    fn host_and_port_only() {
        let config = parse(&["localhost", "7008"]).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 7008);
        assert!(config.transmitters.is_empty());
        assert_eq!(config.report_interval_ms, 35_000);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.accepts(42));
    }

    #[test]
    fn decimal_and_hex_filters() {
        let config = parse(&["localhost", "7008", "1234", "-x", "FFE", "99", "-X", "0xffffffff"])
            .unwrap();
        let expected: HashSet<i32> = [1234, 0x0FFE, 99, -1].into_iter().collect();
        assert_eq!(config.transmitters, expected);
        assert!(config.accepts(4094));
        assert!(!config.accepts(100));
    }

    #[test]
    fn negative_decimal_filter() {
        let config = parse(&["h", "1", "-17"]).unwrap();
        assert!(config.accepts(-17));
        assert!(!config.accepts(17));
    }

    #[test]
    fn missing_arguments() {
        assert!(parse(&["localhost"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn bad_port() {
        assert!(parse(&["localhost", "seventy"]).is_err());
        assert!(parse(&["localhost", "70000"]).is_err());
    }

    #[test]
    fn dangling_hex_switch() {
        assert!(parse(&["localhost", "7008", "-x"]).is_err());
    }

    #[test]
    fn bad_filters() {
        assert!(parse(&["h", "1", "abc"]).is_err());
        assert!(parse(&["h", "1", "-x", "xyz"]).is_err());
        assert!(parse(&["h", "1", "-x", "1FFFFFFFF"]).is_err());
    }

    #[test]
    fn hex_ids() {
        assert_eq!(parse_hex_id("4D2"), Ok(1234));
        assert_eq!(parse_hex_id("0x63"), Ok(99));
        assert_eq!(parse_hex_id("80000000"), Ok(i32::MIN));
        assert_eq!(
            parse_hex_id("g1"),
            Err(ConfigError::InvalidTransmitterId("g1".to_string()))
        );
    }

    #[test]
    fn settings_must_be_positive() {
        assert_eq!(parse_setting::<i64>("REPORT_INTERVAL_MS", "5000"), Ok(5000));
        assert!(parse_setting::<i64>("REPORT_INTERVAL_MS", "0").is_err());
        assert!(parse_setting::<u64>("CONNECT_TIMEOUT_SECS", "soon").is_err());
    }

    #[test]
    fn unset_setting_uses_default() {
        assert_eq!(env_setting("TAG_COUNTER_TEST_UNSET_SETTING", 7u64), Ok(7));
    }
}

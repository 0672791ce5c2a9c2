use crate::error::{Error, Result};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Default values for ConnectorConfig
pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_PREPARE_STATEMENTS: bool = true;
pub const DEFAULT_CACHE_ENDPOINTS: bool = true;

/// Consistency level requested for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl ConsistencyLevel {
    /// The canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Any => "ANY",
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Two => "TWO",
            ConsistencyLevel::Three => "THREE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::All => "ALL",
            ConsistencyLevel::LocalQuorum => "LOCAL_QUORUM",
            ConsistencyLevel::EachQuorum => "EACH_QUORUM",
            ConsistencyLevel::Serial => "SERIAL",
            ConsistencyLevel::LocalSerial => "LOCAL_SERIAL",
            ConsistencyLevel::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.to_ascii_uppercase().as_str() {
            "ANY" => ConsistencyLevel::Any,
            "ONE" => ConsistencyLevel::One,
            "TWO" => ConsistencyLevel::Two,
            "THREE" => ConsistencyLevel::Three,
            "QUORUM" => ConsistencyLevel::Quorum,
            "ALL" => ConsistencyLevel::All,
            "LOCAL_QUORUM" => ConsistencyLevel::LocalQuorum,
            "EACH_QUORUM" => ConsistencyLevel::EachQuorum,
            "SERIAL" => ConsistencyLevel::Serial,
            "LOCAL_SERIAL" => ConsistencyLevel::LocalSerial,
            "LOCAL_ONE" => ConsistencyLevel::LocalOne,
            _ => return Err(Error::config(format!("unknown consistency level '{}'", s))),
        };
        Ok(level)
    }
}

/// How the rows of a result become the outgoing message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ResultSetConversionStrategy {
    /// Every row
    #[default]
    All,
    /// The first row only, or nothing
    One,
    /// At most this many rows
    Limit(usize),
}

#[allow(clippy::expect_used)]
fn limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^LIMIT_(\d+)$").expect("Failed to create regex pattern for LIMIT strategy")
    })
}

impl FromStr for ResultSetConversionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(ResultSetConversionStrategy::All);
        }
        if s.eq_ignore_ascii_case("ONE") {
            return Ok(ResultSetConversionStrategy::One);
        }

        let limit = limit_pattern()
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .ok_or_else(|| {
                Error::config(format!("unknown result set conversion strategy '{}'", s))
            })?;

        Ok(ResultSetConversionStrategy::Limit(limit))
    }
}

impl TryFrom<String> for ResultSetConversionStrategy {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for ResultSetConversionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSetConversionStrategy::All => f.write_str("ALL"),
            ResultSetConversionStrategy::One => f.write_str("ONE"),
            ResultSetConversionStrategy::Limit(n) => write!(f, "LIMIT_{}", n),
        }
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// Component-wide defaults for CQL endpoints.
///
/// Endpoint URI parameters override these per endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Native protocol port used when a contact-point URI does not name one
    pub default_port: u16,

    /// Consistency level for statements; `None` leaves it to the driver
    pub consistency_level: Option<ConsistencyLevel>,

    /// How rows become the out message body
    pub result_set_conversion_strategy: ResultSetConversionStrategy,

    /// Whether statements should be prepared by the driver
    pub prepare_statements: bool,

    /// Per-request timeout handed to the driver, in milliseconds when deserialized
    #[serde(rename = "request_timeout_ms", deserialize_with = "deserialize_millis")]
    pub request_timeout: Option<Duration>,

    /// Whether the component reuses endpoints created for the same URI
    pub cache_endpoints: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            consistency_level: None,
            result_set_conversion_strategy: ResultSetConversionStrategy::All,
            prepare_statements: DEFAULT_PREPARE_STATEMENTS,
            request_timeout: None,
            cache_endpoints: DEFAULT_CACHE_ENDPOINTS,
        }
    }
}

impl ConnectorConfig {
    /// Creates a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a config from JSON; missing fields take their defaults
    ///
    /// # Example
    /// ```
    /// use cqlbridge::config::{ConnectorConfig, ConsistencyLevel};
    ///
    /// let config = ConnectorConfig::from_json_str(
    ///     r#"{"consistency_level": "LOCAL_QUORUM", "request_timeout_ms": 250}"#,
    /// ).unwrap();
    /// assert_eq!(config.consistency_level, Some(ConsistencyLevel::LocalQuorum));
    /// assert_eq!(config.default_port, 9042);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the default native protocol port
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Sets the default consistency level
    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = Some(level);
        self
    }

    /// Sets the default result set conversion strategy
    pub fn with_result_set_conversion_strategy(
        mut self,
        strategy: ResultSetConversionStrategy,
    ) -> Self {
        self.result_set_conversion_strategy = strategy;
        self
    }

    /// Sets whether statements are prepared
    pub fn with_prepare_statements(mut self, prepare: bool) -> Self {
        self.prepare_statements = prepare;
        self
    }

    /// Sets the default request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets whether endpoints are cached by URI
    pub fn with_cache_endpoints(mut self, cache: bool) -> Self {
        self.cache_endpoints = cache;
        self
    }
}

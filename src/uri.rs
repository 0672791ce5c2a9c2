//! Parsing of `cql:` endpoint addresses
//!
//! Supported forms:
//!
//! - `cql:bean:<clusterBean>/<keyspace>?cql=...`
//! - `cql:bean:<sessionBean>?cql=...`
//! - `cql:<host1>,<host2>[:port]/<keyspace>?cql=...`
//!
//! The `cql` parameter is either a literal statement or `#<registryKey>`.

use crate::config::{ConsistencyLevel, ResultSetConversionStrategy};
use crate::error::{Error, Result};

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// URI scheme handled by this connector
pub const SCHEME: &str = "cql";

const BEAN_PREFIX: &str = "bean:";
const REFERENCE_PREFIX: char = '#';

/// Where the endpoint gets its connection from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDescriptor {
    /// A cluster or session bound in the registry
    Bean {
        /// Registry name
        name: String,
        /// Keyspace path segment, if present
        keyspace: Option<String>,
    },
    /// Contact points the component builds a cluster from
    ContactPoints {
        /// Host names or addresses
        hosts: Vec<String>,
        /// Explicit port, if given
        port: Option<u16>,
        /// Keyspace path segment, if present
        keyspace: Option<String>,
    },
}

impl TargetDescriptor {
    /// The keyspace path segment
    pub fn keyspace(&self) -> Option<&str> {
        match self {
            TargetDescriptor::Bean { keyspace, .. }
            | TargetDescriptor::ContactPoints { keyspace, .. } => keyspace.as_deref(),
        }
    }
}

/// The statement an endpoint executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementDescriptor {
    /// Inline statement text
    Literal(String),
    /// Registry key holding the statement text
    Reference(String),
}

/// Optional endpoint parameters. Unset values fall back to the component config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointParams {
    pub consistency_level: Option<ConsistencyLevel>,
    pub result_set_conversion_strategy: Option<ResultSetConversionStrategy>,
    pub prepare_statements: Option<bool>,
    pub timeout: Option<Duration>,
    pub cluster_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A parsed endpoint address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUri {
    raw: String,
    target: TargetDescriptor,
    statement: Option<StatementDescriptor>,
    params: EndpointParams,
}

#[allow(clippy::expect_used)]
fn contact_points_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<hosts>[^:/]+)(?::(?P<port>\d+))?$")
            .expect("Failed to create regex pattern for contact points")
    })
}

impl EndpointUri {
    /// Parses an endpoint address
    ///
    /// # Example
    /// ```
    /// use cqlbridge::uri::{EndpointUri, StatementDescriptor, TargetDescriptor};
    ///
    /// let uri = EndpointUri::parse("cql:bean:cassandraCluster/camel_ks?cql=#insertCql").unwrap();
    /// assert_eq!(uri.target().keyspace(), Some("camel_ks"));
    /// assert_eq!(
    ///     uri.statement(),
    ///     Some(&StatementDescriptor::Reference("insertCql".to_string()))
    /// );
    /// ```
    pub fn parse(uri: &str) -> Result<Self> {
        let raw = uri.trim();
        // error context never carries the password
        let shown = mask_password(raw);

        let (scheme, remaining) = raw
            .split_once(':')
            .ok_or_else(|| Error::config(format!("'{}' has no scheme", shown)))?;
        if scheme != SCHEME {
            return Err(Error::config(format!(
                "unsupported scheme '{}' in '{}', expected '{}'",
                scheme, shown, SCHEME
            )));
        }

        let remaining = remaining.strip_prefix("//").unwrap_or(remaining);
        let (path, query) = match remaining.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (remaining, None),
        };

        let target = parse_target(path).map_err(|e| match e {
            Error::Configuration(reason) => Error::config(format!("{} in '{}'", reason, shown)),
            other => other,
        })?;

        let mut statement = None;
        let mut params = EndpointParams::default();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    Error::config(format!("parameter '{}' has no value in '{}'", pair, shown))
                })?;
                let value = urlencoding::decode(value)
                    .map_err(|e| Error::config(format!("parameter '{}' is not UTF-8: {}", key, e)))?
                    .into_owned();

                match key {
                    "cql" => statement = Some(parse_statement(&value)?),
                    "consistencyLevel" => params.consistency_level = Some(value.parse()?),
                    "resultSetConversionStrategy" => {
                        params.result_set_conversion_strategy = Some(value.parse()?)
                    }
                    "prepareStatements" => {
                        params.prepare_statements = Some(parse_bool(key, &value)?)
                    }
                    "timeout" => {
                        let millis = value.parse::<u64>().map_err(|_| {
                            Error::config(format!(
                                "timeout '{}' is not a number of milliseconds",
                                value
                            ))
                        })?;
                        params.timeout = Some(Duration::from_millis(millis));
                    }
                    "clusterName" => params.cluster_name = Some(value),
                    "username" => params.username = Some(value),
                    "password" => params.password = Some(value),
                    unknown => {
                        return Err(Error::config(format!(
                            "unknown parameter '{}' in '{}'",
                            unknown, shown
                        )))
                    }
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            target,
            statement,
            params,
        })
    }

    /// The address as given, trimmed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The connection target descriptor
    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// The statement descriptor, if a `cql` parameter was given
    pub fn statement(&self) -> Option<&StatementDescriptor> {
        self.statement.as_ref()
    }

    /// Optional endpoint parameters
    pub fn params(&self) -> &EndpointParams {
        &self.params
    }

    /// The address with any password value masked, for logging
    pub fn redacted(&self) -> String {
        mask_password(&self.raw)
    }
}

impl fmt::Display for EndpointUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Masks the value of any `password` query parameter in `raw`
fn mask_password(raw: &str) -> String {
    match raw.split_once('?') {
        Some((path, query)) if query.split('&').any(|pair| pair.starts_with("password=")) => {
            let query = query
                .split('&')
                .map(|pair| {
                    if pair.starts_with("password=") {
                        "password=****"
                    } else {
                        pair
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", path, query)
        }
        _ => raw.to_string(),
    }
}

fn split_keyspace(path: &str) -> (&str, Option<String>) {
    match path.split_once('/') {
        Some((head, keyspace)) if !keyspace.is_empty() => (head, Some(keyspace.to_string())),
        Some((head, _)) => (head, None),
        None => (path, None),
    }
}

fn parse_target(path: &str) -> Result<TargetDescriptor> {
    if let Some(bean) = path.strip_prefix(BEAN_PREFIX) {
        let (name, keyspace) = split_keyspace(bean);
        if name.is_empty() {
            return Err(Error::config("empty bean reference"));
        }
        return Ok(TargetDescriptor::Bean {
            name: name.to_string(),
            keyspace,
        });
    }

    let (contact_points, keyspace) = split_keyspace(path);
    let caps = contact_points_pattern()
        .captures(contact_points)
        .ok_or_else(|| Error::config(format!("malformed contact points '{}'", contact_points)))?;

    let hosts: Vec<String> = caps["hosts"]
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();
    if hosts.is_empty() {
        return Err(Error::config("no contact points"));
    }

    let port = caps
        .name("port")
        .map(|m| {
            m.as_str()
                .parse::<u16>()
                .map_err(|_| Error::config(format!("port '{}' is out of range", m.as_str())))
        })
        .transpose()?;

    Ok(TargetDescriptor::ContactPoints {
        hosts,
        port,
        keyspace,
    })
}

fn parse_statement(value: &str) -> Result<StatementDescriptor> {
    if let Some(key) = value.strip_prefix(REFERENCE_PREFIX) {
        if key.is_empty() {
            return Err(Error::config("empty statement reference '#'"));
        }
        return Ok(StatementDescriptor::Reference(key.to_string()));
    }
    if value.trim().is_empty() {
        return Err(Error::config("cql parameter is empty"));
    }
    Ok(StatementDescriptor::Literal(value.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::config(format!("parameter '{}' expects true or false, got '{}'", key, value)))
    }
}

//! The CQL connector endpoint
//!
//! An endpoint resolves its connection target and statement exactly once, when it is
//! created. After that it is read-only and may be shared across any number of
//! producers and threads.

use crate::config::{ConnectorConfig, ConsistencyLevel, ResultSetConversionStrategy};
use crate::error::{Error, Result};
use crate::producer::CqlProducer;
use crate::registry::{Bean, Registry};
use crate::uri::{EndpointUri, StatementDescriptor, TargetDescriptor};
use crate::{Cluster, ClusterFactory, ClusterSpec, Session};

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

/// What the endpoint executes against. Exactly one variant per endpoint.
#[derive(Debug, Clone)]
pub enum ConnectionTarget {
    /// A cluster; producers open a session on `keyspace` when they start
    Cluster {
        cluster: Arc<dyn Cluster>,
        keyspace: String,
    },
    /// A session already bound to its keyspace
    Session { session: Arc<dyn Session> },
}

/// A configured `cql:` endpoint
#[derive(Debug)]
pub struct CqlEndpoint {
    uri: EndpointUri,
    target: ConnectionTarget,
    keyspace: String,
    cql: String,
    consistency_level: Option<ConsistencyLevel>,
    result_set_conversion_strategy: ResultSetConversionStrategy,
    prepare_statements: bool,
    request_timeout: Option<Duration>,
}

impl CqlEndpoint {
    /// Parses `uri` and resolves it against the registry.
    ///
    /// Fails with [`Error::Configuration`] if a referenced name is missing or bound to
    /// the wrong kind of object, or if no keyspace can be determined.
    pub fn new(
        uri: &str,
        registry: &Registry,
        config: &ConnectorConfig,
        cluster_factory: Option<&dyn ClusterFactory>,
    ) -> Result<Self> {
        Self::from_uri(EndpointUri::parse(uri)?, registry, config, cluster_factory)
    }

    /// Resolves an already parsed URI
    pub fn from_uri(
        uri: EndpointUri,
        registry: &Registry,
        config: &ConnectorConfig,
        cluster_factory: Option<&dyn ClusterFactory>,
    ) -> Result<Self> {
        let (target, keyspace) = resolve_target(&uri, registry, config, cluster_factory)?;
        let cql = resolve_statement(&uri, registry)?;

        let params = uri.params();
        let endpoint = Self {
            target,
            keyspace,
            cql,
            consistency_level: params.consistency_level.or(config.consistency_level),
            result_set_conversion_strategy: params
                .result_set_conversion_strategy
                .unwrap_or(config.result_set_conversion_strategy),
            prepare_statements: params.prepare_statements.unwrap_or(config.prepare_statements),
            request_timeout: params.timeout.or(config.request_timeout),
            uri,
        };

        log::debug!(
            "created endpoint {} -> keyspace={}, cql={}",
            endpoint.uri,
            endpoint.keyspace,
            endpoint.cql
        );
        counter!("cql.endpoint.created", 1);

        Ok(endpoint)
    }

    /// The keyspace statements run in
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// The resolved statement text
    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn uri(&self) -> &EndpointUri {
        &self.uri
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn consistency_level(&self) -> Option<ConsistencyLevel> {
        self.consistency_level
    }

    pub fn result_set_conversion_strategy(&self) -> ResultSetConversionStrategy {
        self.result_set_conversion_strategy
    }

    pub fn prepare_statements(&self) -> bool {
        self.prepare_statements
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Starts a producer for this endpoint, connecting to the keyspace if the
    /// target is a cluster
    pub async fn create_producer(self: &Arc<Self>) -> Result<CqlProducer> {
        CqlProducer::start(Arc::clone(self)).await
    }
}

fn resolve_target(
    uri: &EndpointUri,
    registry: &Registry,
    config: &ConnectorConfig,
    cluster_factory: Option<&dyn ClusterFactory>,
) -> Result<(ConnectionTarget, String)> {
    match uri.target() {
        TargetDescriptor::Bean { name, keyspace } => {
            let bean = registry.lookup(name).ok_or_else(|| {
                Error::config(format!("no bean named '{}' in registry for {}", name, uri))
            })?;

            match bean {
                Bean::Cluster(cluster) => {
                    let keyspace = required_keyspace(keyspace.as_deref(), uri)?;
                    Ok((
                        ConnectionTarget::Cluster {
                            cluster: Arc::clone(cluster),
                            keyspace: keyspace.clone(),
                        },
                        keyspace,
                    ))
                }
                Bean::Session(session) => {
                    let keyspace = session_keyspace(session.as_ref(), keyspace.as_deref(), uri)?;
                    Ok((
                        ConnectionTarget::Session {
                            session: Arc::clone(session),
                        },
                        keyspace,
                    ))
                }
                Bean::Value(_) => Err(Error::config(format!(
                    "bean '{}' is a {}, expected a cluster or session for {}",
                    name,
                    bean.kind(),
                    uri
                ))),
            }
        }
        TargetDescriptor::ContactPoints {
            hosts,
            port,
            keyspace,
        } => {
            let factory = cluster_factory.ok_or_else(|| {
                Error::config(format!(
                    "{} names contact points but no cluster factory is configured",
                    uri
                ))
            })?;
            let keyspace = required_keyspace(keyspace.as_deref(), uri)?;

            let params = uri.params();
            let spec = ClusterSpec {
                contact_points: hosts.clone(),
                port: port.unwrap_or(config.default_port),
                cluster_name: params.cluster_name.clone(),
                username: params.username.clone(),
                password: params.password.clone(),
            };
            let cluster = factory.build(&spec).map_err(|source| Error::Connection {
                keyspace: keyspace.clone(),
                source,
            })?;

            Ok((
                ConnectionTarget::Cluster {
                    cluster,
                    keyspace: keyspace.clone(),
                },
                keyspace,
            ))
        }
    }
}

fn required_keyspace(keyspace: Option<&str>, uri: &EndpointUri) -> Result<String> {
    match keyspace {
        Some(ks) if !ks.trim().is_empty() => Ok(ks.to_string()),
        _ => Err(Error::config(format!(
            "{} must name a keyspace as its path segment",
            uri
        ))),
    }
}

fn session_keyspace(
    session: &dyn Session,
    path: Option<&str>,
    uri: &EndpointUri,
) -> Result<String> {
    match (session.keyspace(), path) {
        (Some(bound), Some(path)) if bound != path => {
            log::warn!(
                "{} names keyspace '{}' but its session is bound to '{}'; using '{}'",
                uri,
                path,
                bound,
                bound
            );
            Ok(bound)
        }
        (Some(bound), _) => Ok(bound),
        (None, Some(path)) => Ok(path.to_string()),
        (None, None) => Err(Error::config(format!(
            "session for {} is not bound to a keyspace and none was given",
            uri
        ))),
    }
}

fn resolve_statement(uri: &EndpointUri, registry: &Registry) -> Result<String> {
    match uri.statement() {
        Some(StatementDescriptor::Literal(cql)) => Ok(cql.clone()),
        Some(StatementDescriptor::Reference(key)) => match registry.lookup(key) {
            Some(Bean::Value(cql)) => Ok(cql.clone()),
            Some(other) => Err(Error::config(format!(
                "bean '{}' is a {}, expected statement text for {}",
                key,
                other.kind(),
                uri
            ))),
            None => Err(Error::config(format!(
                "no bean named '{}' in registry for {}",
                key, uri
            ))),
        },
        None => Err(Error::config(format!("{} has no cql parameter", uri))),
    }
}

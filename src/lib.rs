//! # cqlbridge
//!
//! A connector that lets message routes execute CQL statements against a
//! distributed column-store database.
//!
//! An endpoint is addressed with a `cql:` URI. The URI names a cluster or session
//! bound in a [`Registry`] (or contact points the component builds a cluster
//! from), and the statement to run, either inline or as `#<registryKey>`.
//! Everything is resolved once when the endpoint is created; afterwards the
//! endpoint is read-only. Each message delivered to the endpoint's producer runs
//! the statement once, binding the message body positionally.
//!
//! The database itself is a collaborator behind the [`Cluster`] and [`Session`]
//! traits. The [`memory`] module provides an in-memory implementation for tests.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cqlbridge::memory::InMemoryCluster;
//! use cqlbridge::{CqlComponent, Message, Registry, Router};
//! use std::sync::Arc;
//!
//! # async fn example() -> cqlbridge::Result<()> {
//! let cluster = Arc::new(InMemoryCluster::new("localhost").with_keyspace("camel_ks"));
//!
//! let mut registry = Registry::new();
//! registry.bind_cluster("cassandraCluster", cluster.clone());
//! registry.bind_value(
//!     "insertCql",
//!     "insert into camel_user(login, first_name, last_name) values (?, ?, ?)",
//! );
//!
//! let component = Arc::new(CqlComponent::new(registry));
//! let mut router = Router::new(component.clone());
//! router
//!     .add_route("direct:input", "cql:bean:cassandraCluster/camel_ks?cql=#insertCql")
//!     .await?;
//!
//! let message = Message::from_values(vec!["alice".into(), "Alice".into(), "Smith".into()]);
//! router.send("direct:input", message).await?;
//!
//! assert_eq!(cluster.executed().len(), 1);
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

pub mod component;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod exchange;
pub mod memory;
pub mod producer;
pub mod registry;
pub mod route;
pub mod statement;
pub mod uri;
pub mod value;

pub use crate::component::CqlComponent;
pub use crate::config::{ConnectorConfig, ConsistencyLevel, ResultSetConversionStrategy};
pub use crate::endpoint::{ConnectionTarget, CqlEndpoint};
pub use crate::error::{DriverError, Error, Result};
pub use crate::exchange::{Body, Message};
pub use crate::producer::CqlProducer;
pub use crate::registry::{Bean, Registry};
pub use crate::route::Router;
pub use crate::statement::Statement;
pub use crate::uri::EndpointUri;
pub use crate::value::{CqlValue, ResultSet, Row};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A connected session, bound to a keyspace or not
#[async_trait]
pub trait Session: Send + Sync + fmt::Debug {
    /// The keyspace this session is bound to, if any
    fn keyspace(&self) -> Option<String>;

    /// Executes a statement.
    ///
    /// Implementations enforce [`Statement::timeout`] and report it as
    /// [`DriverError::Timeout`].
    async fn execute(&self, statement: &Statement) -> std::result::Result<ResultSet, DriverError>;
}

/// A handle to a database cluster
#[async_trait]
pub trait Cluster: Send + Sync + fmt::Debug {
    /// Cluster name, for diagnostics
    fn name(&self) -> &str;

    /// Opens a session bound to `keyspace`
    async fn connect(&self, keyspace: &str) -> std::result::Result<Arc<dyn Session>, DriverError>;
}

/// Connection settings for building a cluster from contact points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    /// Host names or addresses
    pub contact_points: Vec<String>,
    /// Native protocol port
    pub port: u16,
    /// Optional cluster name
    pub cluster_name: Option<String>,
    /// Optional username
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
}

/// Builds clusters for contact-point endpoint URIs
pub trait ClusterFactory: Send + Sync + fmt::Debug {
    /// Creates a cluster handle for the given settings
    fn build(&self, spec: &ClusterSpec) -> std::result::Result<Arc<dyn Cluster>, DriverError>;
}

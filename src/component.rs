use crate::config::ConnectorConfig;
use crate::endpoint::CqlEndpoint;
use crate::error::Result;
use crate::registry::Registry;
use crate::uri::EndpointUri;
use crate::ClusterFactory;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Creates `cql:` endpoints from URIs.
///
/// Owns the registry that `bean:` and `#` references resolve against, the
/// component-wide config, and the cluster factory used for contact-point URIs.
/// Endpoints are cached by URI unless caching is disabled in the config.
#[derive(Debug)]
pub struct CqlComponent {
    registry: Registry,
    config: ConnectorConfig,
    cluster_factory: Option<Arc<dyn ClusterFactory>>,
    endpoints: Mutex<HashMap<String, Arc<CqlEndpoint>>>,
}

impl CqlComponent {
    /// Creates a component with the default config
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, ConnectorConfig::default())
    }

    /// Creates a component with the given config
    pub fn with_config(registry: Registry, config: ConnectorConfig) -> Self {
        Self {
            registry,
            config,
            cluster_factory: None,
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the factory used for `cql:<hosts>/<keyspace>` URIs
    pub fn with_cluster_factory(mut self, factory: Arc<dyn ClusterFactory>) -> Self {
        self.cluster_factory = Some(factory);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    fn endpoints(&self) -> MutexGuard<'_, HashMap<String, Arc<CqlEndpoint>>> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the endpoint for `uri`, creating it on first use
    pub fn endpoint(&self, uri: &str) -> Result<Arc<CqlEndpoint>> {
        let parsed = EndpointUri::parse(uri)?;
        let key = parsed.as_str().to_string();

        if !self.config.cache_endpoints {
            return self.create(parsed);
        }

        let mut endpoints = self.endpoints();
        if let Some(existing) = endpoints.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let endpoint = self.create(parsed)?;
        endpoints.insert(key, Arc::clone(&endpoint));
        Ok(endpoint)
    }

    fn create(&self, uri: EndpointUri) -> Result<Arc<CqlEndpoint>> {
        let endpoint = CqlEndpoint::from_uri(
            uri,
            &self.registry,
            &self.config,
            self.cluster_factory.as_deref(),
        )?;
        Ok(Arc::new(endpoint))
    }

    /// Drops the cached endpoint for `uri`
    pub fn remove_endpoint(&self, uri: &str) -> Option<Arc<CqlEndpoint>> {
        self.endpoints().remove(uri.trim())
    }

    /// Number of cached endpoints
    pub fn endpoint_count(&self) -> usize {
        self.endpoints().len()
    }
}

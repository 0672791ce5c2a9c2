//! Direct routes into CQL endpoints
//!
//! Stands in for the host routing engine: `from("direct:name").to("cql:...")` becomes
//! [`Router::add_route`], and delivering a message becomes [`Router::send`].

use crate::component::CqlComponent;
use crate::endpoint::CqlEndpoint;
use crate::error::{Error, Result};
use crate::exchange::Message;
use crate::producer::CqlProducer;

use std::collections::HashMap;
use std::sync::Arc;

const DIRECT_PREFIX: &str = "direct:";

#[derive(Debug)]
struct Route {
    to: String,
    producer: CqlProducer,
}

/// A table of started `direct:` routes
#[derive(Debug)]
pub struct Router {
    component: Arc<CqlComponent>,
    routes: HashMap<String, Route>,
}

impl Router {
    pub fn new(component: Arc<CqlComponent>) -> Self {
        Self {
            component,
            routes: HashMap::new(),
        }
    }

    pub fn component(&self) -> &Arc<CqlComponent> {
        &self.component
    }

    /// Starts a route from `direct:<name>` to a `cql:` endpoint.
    ///
    /// Endpoint configuration errors and connection failures are returned and the
    /// route is not added.
    pub async fn add_route(&mut self, from: &str, to: &str) -> Result<()> {
        let name = from
            .strip_prefix(DIRECT_PREFIX)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Route(format!("'{}' is not a direct: address", from)))?;
        if self.routes.contains_key(from) {
            return Err(Error::Route(format!("route '{}' already exists", from)));
        }

        let endpoint = self.component.endpoint(to)?;
        let target = endpoint.uri().as_str().to_string();
        let producer = match endpoint.create_producer().await {
            Ok(producer) => producer,
            Err(e) => {
                self.release_unused(&target);
                return Err(e);
            }
        };

        log::info!("route {} -> {} started", name, endpoint.uri());
        self.routes.insert(from.to_string(), Route { to: target, producer });
        Ok(())
    }

    /// Drops the cached endpoint for `to` unless a started route still targets it
    fn release_unused(&self, to: &str) {
        if !self.routes.values().any(|route| route.to == to) {
            self.component.remove_endpoint(to);
        }
    }

    /// Delivers a message to the route started from `from` and returns the out message
    pub async fn send(&self, from: &str, message: Message) -> Result<Message> {
        let route = self
            .routes
            .get(from)
            .ok_or_else(|| Error::Route(format!("no route from '{}'", from)))?;
        route.producer.process(&message).await
    }

    /// The endpoint a route delivers to
    pub fn endpoint(&self, from: &str) -> Option<&Arc<CqlEndpoint>> {
        self.routes.get(from).map(|route| route.producer.endpoint())
    }

    /// Stops a route. Its endpoint is released from the component cache once no
    /// other route targets it.
    pub fn remove_route(&mut self, from: &str) -> bool {
        let Some(route) = self.routes.remove(from) else {
            return false;
        };

        self.release_unused(&route.to);
        log::info!("route {} stopped", from);
        true
    }

    /// Names of started routes, sorted
    pub fn route_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCluster;
    use crate::registry::Registry;

    const URI: &str = "cql:bean:cluster/ks?cql=select%20*%20from%20t";

    fn router() -> Router {
        let mut registry = Registry::new();
        let cluster = InMemoryCluster::new("localhost").with_keyspace("ks");
        registry.bind_cluster("cluster", Arc::new(cluster));
        Router::new(Arc::new(CqlComponent::new(registry)))
    }

    #[tokio::test]
    async fn test_add_and_remove_routes() {
        let mut router = router();
        router.add_route("direct:a", URI).await.unwrap();
        router.add_route("direct:b", URI).await.unwrap();
        assert_eq!(router.route_ids(), vec!["direct:a", "direct:b"]);
        assert_eq!(router.component().endpoint_count(), 1);

        assert!(router.remove_route("direct:a"));
        assert_eq!(router.component().endpoint_count(), 1);
        assert!(router.remove_route("direct:b"));
        assert_eq!(router.component().endpoint_count(), 0);
        assert!(!router.remove_route("direct:b"));
    }

    #[tokio::test]
    async fn test_route_errors() {
        let mut router = router();

        let err = router.add_route("seda:a", URI).await.unwrap_err();
        assert!(matches!(err, Error::Route(_)));
        let err = router.add_route("direct:", URI).await.unwrap_err();
        assert!(matches!(err, Error::Route(_)));

        router.add_route("direct:a", URI).await.unwrap();
        let err = router.add_route("direct:a", URI).await.unwrap_err();
        assert!(matches!(err, Error::Route(_)));

        let err = router.send("direct:missing", Message::default()).await.unwrap_err();
        assert!(matches!(err, Error::Route(_)));
    }

    #[tokio::test]
    async fn test_bad_endpoint_does_not_start_route() {
        let mut router = router();
        let err = router
            .add_route("direct:a", "cql:bean:nope/ks?cql=select%201")
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(router.route_ids().is_empty());
        assert!(router.endpoint("direct:a").is_none());
    }

    #[tokio::test]
    async fn test_failed_connect_releases_endpoint() {
        let mut registry = Registry::new();
        registry.bind_cluster("cluster", Arc::new(InMemoryCluster::new("localhost")));
        let mut router = Router::new(Arc::new(CqlComponent::new(registry)));

        let err = router.add_route("direct:a", URI).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(router.route_ids().is_empty());
        assert_eq!(router.component().endpoint_count(), 0);
    }
}

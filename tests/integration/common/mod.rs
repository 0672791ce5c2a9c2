// Shared fixtures for the connector integration tests

use cqlbridge::memory::InMemoryCluster;
use cqlbridge::{CqlComponent, Registry, Router};
use std::sync::Arc;

pub const KEYSPACE: &str = "camel_ks";
pub const CQL: &str = "insert into camel_user(login, first_name, last_name) values (?, ?, ?)";
pub const SESSION_URI: &str = "cql:bean:cassandraSession?cql=#insertCql";
pub const CLUSTER_URI: &str = "cql:bean:cassandraCluster/camel_ks?cql=#insertCql";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// A cluster on localhost with the test keyspace
pub fn create_cluster() -> Arc<InMemoryCluster> {
    Arc::new(InMemoryCluster::new("localhost").with_keyspace(KEYSPACE))
}

// Registry with the cluster, a session opened from it and the insert statement
pub fn create_registry(cluster: &Arc<InMemoryCluster>) -> Registry {
    let mut registry = Registry::new();
    registry.bind_cluster("cassandraCluster", cluster.clone());
    registry.bind_session(
        "cassandraSession",
        cluster.session(KEYSPACE).expect("Failed to open session"),
    );
    registry.bind_value("insertCql", CQL);
    registry
}

// Router with direct:inputSession and direct:inputCluster started
pub async fn create_router(cluster: &Arc<InMemoryCluster>) -> Router {
    init_logging();

    let component = Arc::new(CqlComponent::new(create_registry(cluster)));
    let mut router = Router::new(component);
    router
        .add_route("direct:inputSession", SESSION_URI)
        .await
        .expect("Failed to start session route");
    router
        .add_route("direct:inputCluster", CLUSTER_URI)
        .await
        .expect("Failed to start cluster route");
    router
}

// Execution failures surface to the caller with context and are never retried

use crate::integration::common::{create_cluster, create_router, init_logging, CQL, KEYSPACE};
use cqlbridge::memory::InMemoryCluster;
use cqlbridge::{CqlComponent, DriverError, Error, Message, Registry, Router};
use std::sync::Arc;
use std::time::Duration;

const CLUSTER_ROUTE_URI: &str = "cql:bean:cassandraCluster/camel_ks?cql=#insertCql";

fn alice() -> Message {
    Message::from_values(vec!["alice".into(), "Alice".into(), "Smith".into()])
}

#[tokio::test]
async fn test_query_failure_is_an_execution_error() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;
    cluster.fail_next(DriverError::Query("unconfigured table camel_user".to_string()));

    let err = router
        .send("direct:inputSession", alice())
        .await
        .expect_err("execution should fail");

    assert!(err.is_execution());
    match err {
        Error::Execution { cql, keyspace, source } => {
            assert_eq!(cql, CQL);
            assert_eq!(keyspace, KEYSPACE);
            assert!(matches!(source, DriverError::Query(_)));
        }
        other => panic!("unexpected error {:?}", other),
    }

    // Exactly one attempt
    assert_eq!(cluster.executed().len(), 1);

    // The route keeps working for the next message
    router
        .send("direct:inputSession", alice())
        .await
        .expect("second message should succeed");
    assert_eq!(cluster.executed().len(), 2);
}

#[tokio::test]
async fn test_wrong_number_of_bind_values() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;

    let err = router
        .send("direct:inputCluster", Message::from_values(vec!["alice".into()]))
        .await
        .expect_err("three placeholders, one value");
    assert!(matches!(
        err.driver_error(),
        Some(DriverError::Query(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_an_execution_error() {
    init_logging();

    let cluster = Arc::new(
        InMemoryCluster::new("localhost")
            .with_keyspace(KEYSPACE)
            .with_latency(Duration::from_secs(2)),
    );
    let mut registry = Registry::new();
    registry.bind_cluster("cassandraCluster", cluster.clone());
    registry.bind_value("insertCql", CQL);

    let mut router = Router::new(Arc::new(CqlComponent::new(registry)));
    router
        .add_route(
            "direct:slow",
            "cql:bean:cassandraCluster/camel_ks?cql=#insertCql&timeout=100",
        )
        .await
        .expect("Failed to start route");

    let err = router
        .send("direct:slow", alice())
        .await
        .expect_err("request should time out");

    assert!(err.is_execution());
    assert_eq!(
        err.driver_error(),
        Some(&DriverError::Timeout(Duration::from_millis(100)))
    );
    assert_eq!(cluster.executed().len(), 1);
}

#[tokio::test]
async fn test_missing_keyspace_fails_route_start() {
    init_logging();

    let cluster = Arc::new(InMemoryCluster::new("localhost"));
    let mut registry = Registry::new();
    registry.bind_cluster("cassandraCluster", cluster.clone());
    registry.bind_value("insertCql", CQL);

    let mut router = Router::new(Arc::new(CqlComponent::new(registry)));
    let err = router
        .add_route("direct:inputCluster", CLUSTER_ROUTE_URI)
        .await
        .expect_err("keyspace does not exist");

    assert!(matches!(
        err,
        Error::Connection { source: DriverError::KeyspaceNotFound(_), .. }
    ));
    assert!(router.route_ids().is_empty());
    assert_eq!(router.component().endpoint_count(), 0);

    cluster.create_keyspace("camel_ks");
    router
        .add_route("direct:inputCluster", CLUSTER_ROUTE_URI)
        .await
        .expect("Failed to start route once keyspace exists");
    assert_eq!(router.component().endpoint_count(), 1);
}

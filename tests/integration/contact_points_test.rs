// Endpoints that name contact points instead of a registry bean

use crate::integration::common::{init_logging, CQL, KEYSPACE};
use cqlbridge::memory::InMemoryClusterFactory;
use cqlbridge::{
    Body, ConnectorConfig, ConsistencyLevel, CqlComponent, Message, Registry, ResultSet, Router,
    Row,
};
use std::sync::Arc;

const SELECT: &str = "select login, first_name from camel_user";

#[tokio::test]
async fn test_contact_point_route_end_to_end() {
    init_logging();

    let factory = Arc::new(
        InMemoryClusterFactory::new()
            .with_keyspace(KEYSPACE)
            .with_credentials("camel", "secret"),
    );
    let mut registry = Registry::new();
    registry.bind_value("insertCql", CQL);
    registry.bind_value("selectCql", SELECT);

    let config = ConnectorConfig::new().with_consistency_level(ConsistencyLevel::LocalQuorum);
    let component = Arc::new(
        CqlComponent::with_config(registry, config).with_cluster_factory(factory.clone()),
    );
    let mut router = Router::new(component);

    router
        .add_route(
            "direct:insert",
            "cql:node1,node2/camel_ks?cql=#insertCql&username=camel&password=secret",
        )
        .await
        .expect("Failed to start insert route");
    router
        .add_route(
            "direct:select",
            "cql:node1:9142/camel_ks?cql=#selectCql&username=camel&password=secret&resultSetConversionStrategy=ONE",
        )
        .await
        .expect("Failed to start select route");

    let clusters = factory.clusters();
    assert_eq!(clusters.len(), 2);
    assert_eq!(
        clusters[0].contact_points(),
        &["node1:9042".to_string(), "node2:9042".to_string()]
    );
    assert_eq!(clusters[1].contact_points(), &["node1:9142".to_string()]);

    router
        .send(
            "direct:insert",
            Message::from_json(serde_json::json!(["alice", "Alice", "Smith"])),
        )
        .await
        .expect("insert failed");
    let executed = clusters[0].executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].consistency_level, Some(ConsistencyLevel::LocalQuorum));

    clusters[1].respond_with(
        SELECT,
        ResultSet::from_rows(vec![
            Row::new().with("login", "alice").with("first_name", "Alice"),
            Row::new().with("login", "bob").with("first_name", "Bob"),
        ]),
    );
    let out = router
        .send("direct:select", Message::default())
        .await
        .expect("select failed");
    assert_eq!(
        out.body(),
        &Body::Row(Some(Row::new().with("login", "alice").with("first_name", "Alice")))
    );
}

#[tokio::test]
async fn test_bad_credentials_fail_route_start() {
    init_logging();

    let factory = Arc::new(InMemoryClusterFactory::new().with_credentials("camel", "secret"));
    let mut registry = Registry::new();
    registry.bind_value("insertCql", CQL);
    let component = Arc::new(CqlComponent::new(registry).with_cluster_factory(factory));
    let mut router = Router::new(component);

    let err = router
        .add_route(
            "direct:insert",
            "cql:node1/camel_ks?cql=#insertCql&username=camel&password=wrong",
        )
        .await
        .expect_err("credentials are wrong");

    assert!(err.to_string().contains("authentication failed"));
    assert!(!err.to_string().contains("wrong"));
}

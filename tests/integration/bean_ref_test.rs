// Endpoints resolved from registry references: a cluster plus keyspace, or a bound session

use crate::integration::common::{
    create_cluster, create_registry, create_router, CLUSTER_URI, CQL, KEYSPACE, SESSION_URI,
};
use cqlbridge::{ConnectionTarget, CqlComponent, CqlValue, Message};
use std::sync::Arc;

fn alice() -> Message {
    Message::from_values(vec!["alice".into(), "Alice".into(), "Smith".into()])
}

#[tokio::test]
async fn test_session() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;

    let endpoint = router
        .component()
        .endpoint(SESSION_URI)
        .expect("Failed to get endpoint");

    assert_eq!(KEYSPACE, endpoint.keyspace());
    assert_eq!(CQL, endpoint.cql());
    assert!(matches!(endpoint.target(), ConnectionTarget::Session { .. }));

    // The route and the lookup share one endpoint instance
    let routed = router.endpoint("direct:inputSession").expect("route has an endpoint");
    assert!(Arc::ptr_eq(&endpoint, routed));
}

#[tokio::test]
async fn test_cluster() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;

    let endpoint = router
        .component()
        .endpoint(CLUSTER_URI)
        .expect("Failed to get endpoint");

    assert_eq!(KEYSPACE, endpoint.keyspace());
    assert_eq!(CQL, endpoint.cql());
    assert!(matches!(
        endpoint.target(),
        ConnectionTarget::Cluster { keyspace, .. } if keyspace == KEYSPACE
    ));
}

#[tokio::test]
async fn test_session_and_cluster_forms_agree_on_keyspace() {
    let cluster = create_cluster();
    let component = CqlComponent::new(create_registry(&cluster));

    let by_session = component.endpoint(SESSION_URI).expect("session endpoint");
    let by_cluster = component.endpoint(CLUSTER_URI).expect("cluster endpoint");

    assert_eq!(by_session.keyspace(), by_cluster.keyspace());
    assert_eq!(by_session.cql(), by_cluster.cql());
}

#[tokio::test]
async fn test_message_through_session_route() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;

    router
        .send("direct:inputSession", alice())
        .await
        .expect("Failed to process message");

    let executed = cluster.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].cql, CQL);
    assert_eq!(executed[0].keyspace.as_deref(), Some(KEYSPACE));
    assert_eq!(
        executed[0].values,
        vec![
            CqlValue::from("alice"),
            CqlValue::from("Alice"),
            CqlValue::from("Smith")
        ]
    );
}

#[tokio::test]
async fn test_message_through_cluster_route() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;
    let opened_before = cluster.sessions_opened();

    router
        .send("direct:inputCluster", alice())
        .await
        .expect("Failed to process message");

    // The cluster route connected when it started, not per message
    assert_eq!(cluster.sessions_opened(), opened_before);

    let executed = cluster.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].keyspace.as_deref(), Some(KEYSPACE));
    assert_eq!(executed[0].values.len(), 3);
    assert_eq!(executed[0].values[0], CqlValue::from("alice"));
    assert_eq!(executed[0].values[2], CqlValue::from("Smith"));
}

#[tokio::test]
async fn test_missing_reference_fails_route_start() {
    let cluster = create_cluster();
    let router = create_router(&cluster).await;

    let err = router
        .component()
        .endpoint("cql:bean:cassandraCluster/camel_ks?cql=#updateCql")
        .expect_err("unknown statement reference");
    assert!(err.is_configuration());

    let err = router
        .component()
        .endpoint("cql:bean:otherSession?cql=#insertCql")
        .expect_err("unknown session reference");
    assert!(err.is_configuration());
}

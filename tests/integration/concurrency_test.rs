// Concurrent deliveries share one endpoint and one session

use crate::integration::common::{create_cluster, create_router, CQL};
use cqlbridge::{CqlValue, Message};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

const MESSAGES: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_through_both_routes() {
    let cluster = create_cluster();
    let router = Arc::new(create_router(&cluster).await);
    let sessions_before = cluster.sessions_opened();

    let handles: Vec<_> = (0..MESSAGES)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let from = if i % 2 == 0 {
                    "direct:inputSession"
                } else {
                    "direct:inputCluster"
                };
                let message = Message::from_values(vec![
                    format!("user{}", i).into(),
                    "First".into(),
                    "Last".into(),
                ]);
                router.send(from, message).await
            })
        })
        .collect();

    for result in join_all(handles).await {
        result
            .expect("task panicked")
            .expect("Failed to process message");
    }

    assert_eq!(cluster.sessions_opened(), sessions_before);

    let executed = cluster.executed();
    assert_eq!(executed.len(), MESSAGES);
    assert!(executed.iter().all(|e| e.cql == CQL));

    let logins: HashSet<String> = executed
        .iter()
        .filter_map(|e| e.values.first().and_then(CqlValue::as_text).map(str::to_string))
        .collect();
    assert_eq!(logins.len(), MESSAGES);
}

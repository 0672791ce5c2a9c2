use crate::config::ResultSetConversionStrategy;
use crate::endpoint::{ConnectionTarget, CqlEndpoint};
use crate::error::{Error, Result};
use crate::exchange::{Body, Message, CQL_APPLIED_HEADER, CQL_QUERY_HEADER};
use crate::statement::Statement;
use crate::value::ResultSet;
use crate::Session;

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

/// Executes an endpoint's statement once per message.
///
/// Holds only the endpoint and the session it runs against, both shared and
/// read-only, so `process` can be called concurrently.
#[derive(Debug)]
pub struct CqlProducer {
    endpoint: Arc<CqlEndpoint>,
    session: Arc<dyn Session>,
}

impl CqlProducer {
    /// Starts a producer. A cluster target opens one session on the endpoint keyspace;
    /// a session target is used as is.
    pub async fn start(endpoint: Arc<CqlEndpoint>) -> Result<Self> {
        let session = match endpoint.target() {
            ConnectionTarget::Session { session } => Arc::clone(session),
            ConnectionTarget::Cluster { cluster, keyspace } => {
                log::debug!("connecting to cluster {} keyspace {}", cluster.name(), keyspace);
                cluster
                    .connect(keyspace)
                    .await
                    .map_err(|source| Error::Connection {
                        keyspace: keyspace.clone(),
                        source,
                    })?
            }
        };

        log::info!("started producer for {}", endpoint.uri());

        Ok(Self { endpoint, session })
    }

    pub fn endpoint(&self) -> &Arc<CqlEndpoint> {
        &self.endpoint
    }

    /// Executes the statement with the message body as bind values and returns the
    /// out message. Failures are not retried.
    pub async fn process(&self, message: &Message) -> Result<Message> {
        let values = message.bind_values()?;
        let cql = message
            .header(CQL_QUERY_HEADER)
            .unwrap_or_else(|| self.endpoint.cql());

        let statement = Statement::new(cql)
            .with_values(values)
            .with_consistency_level(self.endpoint.consistency_level())
            .with_timeout(self.endpoint.request_timeout())
            .with_prepare(self.endpoint.prepare_statements());

        log::debug!(
            "executing '{}' on keyspace {} with {} bind values",
            cql,
            self.endpoint.keyspace(),
            statement.values().len()
        );

        let start = Instant::now();
        let result = self.session.execute(&statement).await;
        histogram!("cql.producer.execute.time", start.elapsed());
        counter!("cql.producer.execute", 1);

        let result = result.map_err(|source| {
            counter!("cql.producer.failure", 1);
            log::debug!("'{}' failed: {}", cql, source);
            Error::Execution {
                cql: cql.to_string(),
                keyspace: self.endpoint.keyspace().to_string(),
                source,
            }
        })?;

        let applied = result.was_applied();
        let mut out = message.clone();
        out.set_body(convert(result, self.endpoint.result_set_conversion_strategy()));
        out.set_header(CQL_APPLIED_HEADER, applied.to_string());

        Ok(out)
    }
}

fn convert(result: ResultSet, strategy: ResultSetConversionStrategy) -> Body {
    let rows = result.into_rows();
    match strategy {
        ResultSetConversionStrategy::All => Body::Rows(rows),
        ResultSetConversionStrategy::One => Body::Row(rows.into_iter().next()),
        ResultSetConversionStrategy::Limit(n) => Body::Rows(rows.into_iter().take(n).collect()),
    }
}

//! In-memory database collaborator
//!
//! Implements [`Cluster`], [`Session`] and [`ClusterFactory`] without a real
//! database. Every executed statement is recorded, and the cluster can be scripted
//! to return rows, fail, or respond slowly. Meant for tests and development.

use crate::config::ConsistencyLevel;
use crate::error::DriverError;
use crate::statement::Statement;
use crate::value::{CqlValue, ResultSet};
use crate::{Cluster, ClusterFactory, ClusterSpec, Session};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Name given to clusters built without one
pub const DEFAULT_CLUSTER_NAME: &str = "Test Cluster";

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A statement as the in-memory database received it
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// Keyspace of the executing session, `None` for an unbound session
    pub keyspace: Option<String>,
    pub cql: String,
    pub values: Vec<CqlValue>,
    pub consistency_level: Option<ConsistencyLevel>,
    pub timeout: Option<Duration>,
    pub prepared: bool,
}

#[derive(Debug, Default)]
struct ClusterState {
    keyspaces: RwLock<HashSet<String>>,
    executed: Mutex<Vec<ExecutedStatement>>,
    responses: RwLock<HashMap<String, ResultSet>>,
    failures: Mutex<VecDeque<DriverError>>,
    latency: RwLock<Option<Duration>>,
    sessions_opened: AtomicUsize,
}

impl ClusterState {
    fn record(&self, keyspace: Option<&str>, statement: &Statement) {
        lock(&self.executed).push(ExecutedStatement {
            keyspace: keyspace.map(str::to_string),
            cql: statement.cql().to_string(),
            values: statement.values().to_vec(),
            consistency_level: statement.consistency_level(),
            timeout: statement.timeout(),
            prepared: statement.prepare(),
        });
    }

    fn respond(&self, statement: &Statement) -> Result<ResultSet, DriverError> {
        if let Some(failure) = lock(&self.failures).pop_front() {
            return Err(failure);
        }

        let expected = statement.placeholder_count();
        if expected != statement.values().len() {
            return Err(DriverError::Query(format!(
                "expected {} bind values, got {}",
                expected,
                statement.values().len()
            )));
        }

        Ok(read(&self.responses)
            .get(statement.cql())
            .cloned()
            .unwrap_or_default())
    }
}

/// An in-memory cluster
#[derive(Debug)]
pub struct InMemoryCluster {
    name: String,
    contact_points: Vec<String>,
    state: Arc<ClusterState>,
}

impl InMemoryCluster {
    /// Creates a cluster reachable through a single contact point
    pub fn new(contact_point: impl Into<String>) -> Self {
        Self::with_contact_points(vec![contact_point.into()])
    }

    /// Creates a cluster reachable through the given contact points
    pub fn with_contact_points(contact_points: Vec<String>) -> Self {
        Self {
            name: DEFAULT_CLUSTER_NAME.to_string(),
            contact_points,
            state: Arc::new(ClusterState::default()),
        }
    }

    /// Sets the cluster name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates a keyspace, builder style
    pub fn with_keyspace(self, keyspace: impl Into<String>) -> Self {
        self.create_keyspace(keyspace);
        self
    }

    /// Delays every execution by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    pub fn create_keyspace(&self, keyspace: impl Into<String>) {
        write(&self.state.keyspaces).insert(keyspace.into());
    }

    pub fn has_keyspace(&self, keyspace: &str) -> bool {
        read(&self.state.keyspaces).contains(keyspace)
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *write(&self.state.latency) = latency;
    }

    /// Returns `result` whenever exactly `cql` is executed
    pub fn respond_with(&self, cql: impl Into<String>, result: ResultSet) {
        write(&self.state.responses).insert(cql.into(), result);
    }

    /// Fails the next execution with `error`. Calls queue up.
    pub fn fail_next(&self, error: DriverError) {
        lock(&self.state.failures).push_back(error);
    }

    /// Every statement executed through any session of this cluster, in order
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        lock(&self.state.executed).clone()
    }

    /// Forgets recorded executions
    pub fn clear_executed(&self) {
        lock(&self.state.executed).clear();
    }

    /// Number of sessions opened so far
    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn contact_points(&self) -> &[String] {
        &self.contact_points
    }

    /// Opens a session bound to `keyspace` without going through the async trait
    pub fn session(&self, keyspace: &str) -> Result<Arc<InMemorySession>, DriverError> {
        if !self.has_keyspace(keyspace) {
            return Err(DriverError::KeyspaceNotFound(keyspace.to_string()));
        }
        Ok(Arc::new(self.open(Some(keyspace.to_string()))))
    }

    /// Opens a session not bound to any keyspace
    pub fn unbound_session(&self) -> Arc<InMemorySession> {
        Arc::new(self.open(None))
    }

    fn open(&self, keyspace: Option<String>) -> InMemorySession {
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        InMemorySession {
            keyspace,
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl Cluster for InMemoryCluster {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self, keyspace: &str) -> Result<Arc<dyn Session>, DriverError> {
        let session: Arc<dyn Session> = self.session(keyspace)?;
        Ok(session)
    }
}

/// A session of an [`InMemoryCluster`]
#[derive(Debug)]
pub struct InMemorySession {
    keyspace: Option<String>,
    state: Arc<ClusterState>,
}

#[async_trait]
impl Session for InMemorySession {
    fn keyspace(&self) -> Option<String> {
        self.keyspace.clone()
    }

    async fn execute(&self, statement: &Statement) -> Result<ResultSet, DriverError> {
        self.state.record(self.keyspace.as_deref(), statement);

        let latency = *read(&self.state.latency);
        let work = async {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            self.state.respond(statement)
        };

        match statement.timeout() {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| DriverError::Timeout(limit))?,
            None => work.await,
        }
    }
}

/// Builds [`InMemoryCluster`]s for contact-point URIs
#[derive(Debug, Default)]
pub struct InMemoryClusterFactory {
    keyspaces: Vec<String>,
    credentials: Option<(String, String)>,
    built: Mutex<Vec<Arc<InMemoryCluster>>>,
}

impl InMemoryClusterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyspace every built cluster starts with
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspaces.push(keyspace.into());
        self
    }

    /// Requires these credentials on every build
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Clusters built so far
    pub fn clusters(&self) -> Vec<Arc<InMemoryCluster>> {
        lock(&self.built).clone()
    }
}

impl ClusterFactory for InMemoryClusterFactory {
    fn build(&self, spec: &ClusterSpec) -> Result<Arc<dyn Cluster>, DriverError> {
        if let Some((username, password)) = &self.credentials {
            let supplied = spec.username.as_ref().zip(spec.password.as_ref());
            if supplied != Some((username, password)) {
                return Err(DriverError::Authentication(format!(
                    "bad credentials for user '{}'",
                    spec.username.as_deref().unwrap_or_default()
                )));
            }
        }

        let contact_points = spec
            .contact_points
            .iter()
            .map(|host| format!("{}:{}", host, spec.port))
            .collect();
        let mut cluster = InMemoryCluster::with_contact_points(contact_points);
        if let Some(name) = &spec.cluster_name {
            cluster = cluster.with_name(name.clone());
        }
        for keyspace in &self.keyspaces {
            cluster.create_keyspace(keyspace.clone());
        }

        let cluster = Arc::new(cluster);
        lock(&self.built).push(Arc::clone(&cluster));
        Ok(cluster)
    }
}

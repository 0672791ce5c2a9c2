//! Named objects that endpoint URIs refer to with `bean:<name>` and `#<name>`

use crate::{Cluster, Session};

use std::collections::HashMap;
use std::sync::Arc;

/// A registry entry. The variant is the capability.
#[derive(Debug, Clone)]
pub enum Bean {
    /// A cluster handle; endpoints connect to a keyspace through it
    Cluster(Arc<dyn Cluster>),
    /// A session already bound to a keyspace
    Session(Arc<dyn Session>),
    /// A literal value, such as statement text
    Value(String),
}

impl Bean {
    /// Short capability name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Bean::Cluster(_) => "cluster",
            Bean::Session(_) => "session",
            Bean::Value(_) => "value",
        }
    }
}

/// Name to object mapping handed to the component
#[derive(Debug, Clone, Default)]
pub struct Registry {
    beans: HashMap<String, Bean>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a bean under `name`, returning the one it replaced
    pub fn bind(&mut self, name: impl Into<String>, bean: Bean) -> Option<Bean> {
        self.beans.insert(name.into(), bean)
    }

    /// Binds a cluster handle
    pub fn bind_cluster(
        &mut self,
        name: impl Into<String>,
        cluster: Arc<dyn Cluster>,
    ) -> Option<Bean> {
        self.bind(name, Bean::Cluster(cluster))
    }

    /// Binds a session handle
    pub fn bind_session(
        &mut self,
        name: impl Into<String>,
        session: Arc<dyn Session>,
    ) -> Option<Bean> {
        self.bind(name, Bean::Session(session))
    }

    /// Binds a literal value
    pub fn bind_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<Bean> {
        self.bind(name, Bean::Value(value.into()))
    }

    /// Looks up a bean by name
    pub fn lookup(&self, name: &str) -> Option<&Bean> {
        self.beans.get(name)
    }

    /// Removes a bean
    pub fn unbind(&mut self, name: &str) -> Option<Bean> {
        self.beans.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Iterates over bound names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.beans.keys().map(String::as_str)
    }
}

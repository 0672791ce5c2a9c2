//! Messages passed between a route and the CQL producer

use crate::error::{Error, Result};
use crate::value::{CqlValue, Row};

use serde_json::Value;
use std::collections::HashMap;

/// Header that overrides the endpoint statement for one message
pub const CQL_QUERY_HEADER: &str = "CamelCqlQuery";

/// Header set on the out message: whether a conditional statement was applied
pub const CQL_APPLIED_HEADER: &str = "CamelCqlApplied";

/// Message payload
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// A single value, bound as a one-element sequence
    Value(CqlValue),
    /// Ordered bind values
    Values(Vec<CqlValue>),
    /// A JSON document; arrays bind element-wise, scalars as one value
    Json(Value),
    /// Rows produced by a query
    Rows(Vec<Row>),
    /// A single row produced by a query, or none
    Row(Option<Row>),
}

/// A message with a body and string headers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    body: Body,
    headers: HashMap<String, String>,
}

impl Message {
    pub fn new(body: Body) -> Self {
        Self {
            body,
            headers: HashMap::new(),
        }
    }

    /// A message carrying ordered bind values
    pub fn from_values(values: Vec<CqlValue>) -> Self {
        Self::new(Body::Values(values))
    }

    /// A message carrying a JSON document
    pub fn from_json(value: Value) -> Self {
        Self::new(Body::Json(value))
    }

    /// Adds a header, builder style
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Extracts positional bind values from the body
    pub fn bind_values(&self) -> Result<Vec<CqlValue>> {
        match &self.body {
            Body::Empty => Ok(Vec::new()),
            Body::Value(value) => Ok(vec![value.clone()]),
            Body::Values(values) => Ok(values.clone()),
            Body::Json(Value::Array(items)) => items.iter().map(CqlValue::from_json).collect(),
            Body::Json(Value::Object(_)) => Err(Error::InvalidBody(
                "a JSON object has no positional order; send an array".to_string(),
            )),
            Body::Json(scalar) => Ok(vec![CqlValue::from_json(scalar)?]),
            Body::Rows(_) | Body::Row(_) => Err(Error::InvalidBody(
                "query rows cannot be used as bind values".to_string(),
            )),
        }
    }
}

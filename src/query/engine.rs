//! Query engine implementation
//!
//! Executes a parsed document against a [`Session`]:
//! - Root fields `ensemble(id)` and `allEnsembles`
//! - Depth-first completion of selection sets over [`Node`]s
//! - Per-field error capture: a failing field becomes `null` plus an entry
//!   in `errors`, its siblings still resolve
//!
//! Failures at the root (malformed document, unknown root field, a root
//! lookup that cannot reach the store) abort the request with `data: null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::query::fields;
use crate::query::node::{Node, Resolved};
use crate::query::selection::{self, Field, InputValue};
use crate::query::Session;
use crate::{Error, Result};

/// A query request as sent by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }
}

/// One step of an error path: an object key or a list index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: String,
}

/// An error attached to the response graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    pub extensions: ErrorExtensions,
}

impl FieldError {
    pub fn new(error: &Error, path: &[PathSegment]) -> Self {
        Self {
            message: error.to_string(),
            path: path.to_vec(),
            extensions: ErrorExtensions {
                code: error.code().to_string(),
            },
        }
    }
}

/// Result of executing a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Response {
    /// A response for a request that was aborted as a whole
    pub fn aborted(error: &Error) -> Self {
        Self {
            data: None,
            errors: vec![FieldError::new(error, &[])],
        }
    }

    /// Value at a dotted path inside `data`, e.g. `"ensemble.name"` or
    /// `"allEnsembles.0.id"`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = self.data.as_ref()?;
        for key in path.split('.') {
            current = match current {
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                other => other.get(key)?,
            };
        }
        Some(current)
    }
}

/// Mutable state of one execution
struct Execution<'d> {
    variables: Map<String, Value>,
    defaults: &'d [(String, InputValue)],
    path: Vec<PathSegment>,
    errors: Vec<FieldError>,
}

/// Query engine executing documents over one session
pub struct QueryEngine<'a> {
    session: &'a Session,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute a request. Never fails: errors are reported in the response.
    pub fn execute(&self, request: &Request) -> Response {
        let document = match selection::parse(&request.query) {
            Ok(document) => document,
            Err(err) => return Response::aborted(&err),
        };

        if let (Some(requested), Some(declared)) =
            (&request.operation_name, &document.operation_name)
        {
            if requested != declared {
                return Response::aborted(&Error::Query(format!(
                    "Unknown operation named \"{}\"",
                    requested
                )));
            }
        }

        tracing::debug!(
            "Executing {} ({} root fields)",
            document.operation_name.as_deref().unwrap_or("anonymous query"),
            document.selection.len()
        );

        let mut execution = Execution {
            variables: request.variables.clone().unwrap_or_default(),
            defaults: &document.variable_defaults,
            path: Vec::new(),
            errors: Vec::new(),
        };

        let mut data = Map::new();
        for field in &document.selection {
            execution.path.push(PathSegment::Key(field.response_key().to_string()));
            let value = match self.execute_root(field, &mut execution) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!("Request aborted at root field {}: {}", field.name, err);
                    return Response::aborted(&err);
                }
            };
            execution.path.pop();
            data.insert(field.response_key().to_string(), value);
        }

        Response {
            data: Some(Value::Object(data)),
            errors: execution.errors,
        }
    }

    fn execute_root(&self, field: &Field, execution: &mut Execution) -> Result<Value> {
        let resolved = match field.name.as_str() {
            "ensemble" => {
                let id = int_argument(field, "id", execution)?;
                Resolved::Object(fields::ensemble(self.session, id)?.map(Node::from))
            }
            "allEnsembles" => {
                reject_arguments(field)?;
                Resolved::List(
                    fields::all_ensembles(self.session)?
                        .into_iter()
                        .map(Node::from)
                        .collect(),
                )
            }
            "__typename" => Resolved::Value(Value::from("Query")),
            other => {
                return Err(Error::Query(format!(
                    "Cannot query field \"{}\" on type \"Query\"",
                    other
                )));
            }
        };

        self.complete(resolved, field, execution)
    }

    fn complete_object(&self, node: &Node, selection: &[Field], execution: &mut Execution) -> Value {
        let mut object = Map::new();
        for field in selection {
            execution.path.push(PathSegment::Key(field.response_key().to_string()));
            let value = match self.complete_field(node, field, execution) {
                Ok(value) => value,
                Err(err) => {
                    execution.errors.push(FieldError::new(&err, &execution.path));
                    Value::Null
                }
            };
            execution.path.pop();
            object.insert(field.response_key().to_string(), value);
        }
        Value::Object(object)
    }

    fn complete_field(&self, node: &Node, field: &Field, execution: &mut Execution) -> Result<Value> {
        reject_arguments(field)?;
        let resolved = node.resolve(self.session, &field.name)?;
        self.complete(resolved, field, execution)
    }

    fn complete(&self, resolved: Resolved, field: &Field, execution: &mut Execution) -> Result<Value> {
        if resolved.is_composite() && field.selection.is_empty() {
            return Err(Error::Query(format!(
                "Field \"{}\" must have a selection of subfields",
                field.name
            )));
        }
        if !resolved.is_composite() && !field.selection.is_empty() {
            return Err(Error::Query(format!(
                "Field \"{}\" must not have a selection since it is a leaf",
                field.name
            )));
        }

        Ok(match resolved {
            Resolved::Value(value) => value,
            Resolved::Object(None) => Value::Null,
            Resolved::Object(Some(node)) => self.complete_object(&node, &field.selection, execution),
            Resolved::List(nodes) => {
                let mut items = Vec::with_capacity(nodes.len());
                for (index, node) in nodes.iter().enumerate() {
                    execution.path.push(PathSegment::Index(index));
                    items.push(self.complete_object(node, &field.selection, execution));
                    execution.path.pop();
                }
                Value::Array(items)
            }
        })
    }
}

fn reject_arguments(field: &Field) -> Result<()> {
    match field.arguments.first() {
        Some((name, _)) => Err(Error::Query(format!(
            "Unknown argument \"{}\" on field \"{}\"",
            name, field.name
        ))),
        None => Ok(()),
    }
}

fn int_argument(field: &Field, name: &str, execution: &Execution) -> Result<i64> {
    if let Some((unknown, _)) = field.arguments.iter().find(|(arg, _)| arg != name) {
        return Err(Error::Query(format!(
            "Unknown argument \"{}\" on field \"{}\"",
            unknown, field.name
        )));
    }

    let invalid = || {
        Error::Query(format!(
            "Argument \"{}\" of field \"{}\" must be a non-null Int",
            name, field.name
        ))
    };

    match field.argument(name).ok_or_else(invalid)? {
        InputValue::Int(value) => Ok(*value),
        InputValue::Variable(variable) => match execution.variables.get(variable) {
            Some(value) => value.as_i64().ok_or_else(invalid),
            None => match execution.defaults.iter().find(|(default, _)| default == variable) {
                Some((_, InputValue::Int(value))) => Ok(*value),
                Some(_) => Err(invalid()),
                None => Err(Error::Query(format!(
                    "Variable \"${}\" is not provided",
                    variable
                ))),
            },
        },
        _ => Err(invalid()),
    }
}

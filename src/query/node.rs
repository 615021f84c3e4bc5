//! Public projection of stored rows
//!
//! A [`Node`] wraps a stored row and answers the fields clients can select
//! on it. Raw `*_ref` columns are not selectable: each blob-backed column is
//! exposed only through its decoded accessor, and derived names come from
//! the owning definition.

use serde_json::Value;
use crate::entity::{
    Ensemble, Observation, Parameter, ParameterDefinition, ParameterPrior, Project, Realization,
    Response, ResponseDefinition, Update,
};
use crate::query::{fields, Session};
use crate::{Error, Result};

/// An object in the response graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Project(Project),
    Ensemble(Ensemble),
    Update(Update),
    Realization(Realization),
    ResponseDefinition(ResponseDefinition),
    Response(Response),
    Observation(Observation),
    ParameterDefinition(ParameterDefinition),
    Parameter(Parameter),
    ParameterPrior(ParameterPrior),
}

macro_rules! impl_from_entity {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Node {
                fn from(entity: $variant) -> Self {
                    Node::$variant(entity)
                }
            }
        )*
    };
}

impl_from_entity!(
    Project,
    Ensemble,
    Update,
    Realization,
    ResponseDefinition,
    Response,
    Observation,
    ParameterDefinition,
    Parameter,
    ParameterPrior,
);

/// Outcome of resolving one field on a node
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Leaf value
    Value(Value),
    /// Nullable object
    Object(Option<Node>),
    /// List of objects
    List(Vec<Node>),
}

impl Resolved {
    fn value(value: impl Into<Value>) -> Self {
        Resolved::Value(value.into())
    }

    fn object<T: Into<Node>>(entity: Option<T>) -> Self {
        Resolved::Object(entity.map(Into::into))
    }

    fn list<T: Into<Node>>(entities: Vec<T>) -> Self {
        Resolved::List(entities.into_iter().map(Into::into).collect())
    }

    /// Whether completing this value needs a selection set
    pub fn is_composite(&self) -> bool {
        !matches!(self, Resolved::Value(_))
    }
}

impl Node {
    /// Type name reported through `__typename`
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Project(_) => "Project",
            Node::Ensemble(_) => "Ensemble",
            Node::Update(_) => "Update",
            Node::Realization(_) => "Realization",
            Node::ResponseDefinition(_) => "ResponseDefinition",
            Node::Response(_) => "Response",
            Node::Observation(_) => "Observation",
            Node::ParameterDefinition(_) => "ParameterDefinition",
            Node::Parameter(_) => "Parameter",
            Node::ParameterPrior(_) => "ParameterPrior",
        }
    }

    /// Resolve the field `name`. Only the requested field is computed.
    pub fn resolve(&self, session: &Session, name: &str) -> Result<Resolved> {
        if name == "__typename" {
            return Ok(Resolved::value(self.type_name()));
        }

        let resolved = match self {
            Node::Project(project) => resolve_project(session, project, name)?,
            Node::Ensemble(ensemble) => resolve_ensemble(session, ensemble, name)?,
            Node::Update(update) => resolve_update(session, update, name)?,
            Node::Realization(realization) => resolve_realization(session, realization, name)?,
            Node::ResponseDefinition(definition) => {
                resolve_response_definition(session, definition, name)?
            }
            Node::Response(response) => resolve_response(session, response, name)?,
            Node::Observation(observation) => resolve_observation(session, observation, name)?,
            Node::ParameterDefinition(definition) => {
                resolve_parameter_definition(session, definition, name)?
            }
            Node::Parameter(parameter) => resolve_parameter(session, parameter, name)?,
            Node::ParameterPrior(prior) => resolve_parameter_prior(session, prior, name)?,
        };

        resolved.ok_or_else(|| {
            Error::Query(format!(
                "Cannot query field \"{}\" on type \"{}\"",
                name,
                self.type_name()
            ))
        })
    }
}

type FieldResult = Result<Option<Resolved>>;

fn resolve_project(session: &Session, project: &Project, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(project.id),
        "name" => Resolved::value(project.name.as_str()),
        "ensembles" => Resolved::list(fields::owned_by::<Ensemble>(session, "project_id", project.id)?),
        _ => return Ok(None),
    }))
}

fn resolve_ensemble(session: &Session, ensemble: &Ensemble, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(ensemble.id),
        "name" => Resolved::value(ensemble.name.as_str()),
        "timeCreated" => Resolved::value(ensemble.time_created.clone()),
        "project" => match ensemble.project_id {
            Some(id) => Resolved::object(Some(session.require::<Project>(id)?)),
            None => Resolved::Object(None),
        },
        "realizations" => {
            Resolved::list(fields::owned_by::<Realization>(session, "ensemble_id", ensemble.id)?)
        }
        "responseDefinitions" => Resolved::list(fields::owned_by::<ResponseDefinition>(
            session,
            "ensemble_id",
            ensemble.id,
        )?),
        "parameterDefinitions" => Resolved::list(fields::owned_by::<ParameterDefinition>(
            session,
            "ensemble_id",
            ensemble.id,
        )?),
        "parent" => Resolved::object(fields::parent(session, ensemble)?),
        "children" => Resolved::list(fields::owned_by::<Update>(
            session,
            "ensemble_reference_id",
            ensemble.id,
        )?),
        "updateSource" => Resolved::value(fields::update_source(session, ensemble)?),
        _ => return Ok(None),
    }))
}

fn resolve_update(session: &Session, update: &Update, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(update.id),
        "algorithm" => Resolved::value(update.algorithm.as_str()),
        "ensembleReference" => {
            Resolved::object(Some(session.require::<Ensemble>(update.ensemble_reference_id)?))
        }
        "ensembleResult" => {
            Resolved::object(Some(session.require::<Ensemble>(update.ensemble_result_id)?))
        }
        _ => return Ok(None),
    }))
}

fn resolve_realization(session: &Session, realization: &Realization, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(realization.id),
        "index" => Resolved::value(realization.index),
        "ensemble" => Resolved::object(Some(session.require::<Ensemble>(realization.ensemble_id)?)),
        "responses" => Resolved::list(fields::owned_by::<Response>(
            session,
            "realization_id",
            realization.id,
        )?),
        "parameters" => Resolved::list(fields::owned_by::<Parameter>(
            session,
            "realization_id",
            realization.id,
        )?),
        _ => return Ok(None),
    }))
}

fn resolve_response_definition(
    session: &Session,
    definition: &ResponseDefinition,
    name: &str,
) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(definition.id),
        "name" => Resolved::value(definition.name.as_str()),
        "indexes" => Resolved::value(session.references().resolve_ints(definition.indexes_ref)?),
        "ensemble" => Resolved::object(Some(session.require::<Ensemble>(definition.ensemble_id)?)),
        "responses" => Resolved::list(fields::owned_by::<Response>(
            session,
            "response_definition_id",
            definition.id,
        )?),
        "observations" => Resolved::list(fields::observations(session, definition.id)?),
        _ => return Ok(None),
    }))
}

fn resolve_response(session: &Session, response: &Response, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(response.id),
        "name" => Resolved::value(fields::response_name(session, response)?),
        "values" => Resolved::value(session.references().resolve_floats(response.values_ref)?),
        "realization" => {
            Resolved::object(Some(session.require::<Realization>(response.realization_id)?))
        }
        "responseDefinition" => Resolved::object(Some(
            session.require::<ResponseDefinition>(response.response_definition_id)?,
        )),
        _ => return Ok(None),
    }))
}

fn resolve_observation(session: &Session, observation: &Observation, name: &str) -> FieldResult {
    let references = session.references();
    Ok(Some(match name {
        "id" => Resolved::value(observation.id),
        "name" => Resolved::value(observation.name.as_str()),
        "values" => Resolved::value(references.resolve_floats(observation.values_ref)?),
        "stds" => Resolved::value(references.resolve_floats(observation.stds_ref)?),
        "keyIndexes" => Resolved::value(references.resolve_ints(observation.key_indexes_ref)?),
        "dataIndexes" => Resolved::value(references.resolve_ints(observation.data_indexes_ref)?),
        "responseDefinitions" => {
            Resolved::list(fields::response_definitions(session, observation.id)?)
        }
        _ => return Ok(None),
    }))
}

fn resolve_parameter_definition(
    session: &Session,
    definition: &ParameterDefinition,
    name: &str,
) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(definition.id),
        "name" => Resolved::value(definition.name.as_str()),
        "group" => Resolved::value(definition.group.as_str()),
        "ensemble" => Resolved::object(Some(session.require::<Ensemble>(definition.ensemble_id)?)),
        "parameters" => Resolved::list(fields::owned_by::<Parameter>(
            session,
            "parameter_definition_id",
            definition.id,
        )?),
        "priors" => Resolved::list(fields::owned_by::<ParameterPrior>(
            session,
            "parameter_definition_id",
            definition.id,
        )?),
        _ => return Ok(None),
    }))
}

fn resolve_parameter(session: &Session, parameter: &Parameter, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(parameter.id),
        "name" => Resolved::value(fields::parameter_name(session, parameter)?),
        "value" => Resolved::value(session.references().resolve_scalar(parameter.value_ref)?),
        "realization" => {
            Resolved::object(Some(session.require::<Realization>(parameter.realization_id)?))
        }
        "parameterDefinition" => Resolved::object(Some(
            session.require::<ParameterDefinition>(parameter.parameter_definition_id)?,
        )),
        _ => return Ok(None),
    }))
}

fn resolve_parameter_prior(session: &Session, prior: &ParameterPrior, name: &str) -> FieldResult {
    Ok(Some(match name {
        "id" => Resolved::value(prior.id),
        "function" => Resolved::value(prior.function.as_str()),
        "parameterNames" => Resolved::value(fields::prior_names(prior)?),
        "parameterValues" => Resolved::value(fields::prior_values(prior)?),
        "parameterDefinition" => Resolved::object(Some(
            session.require::<ParameterDefinition>(prior.parameter_definition_id)?,
        )),
        _ => return Ok(None),
    }))
}

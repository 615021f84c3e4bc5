//! Derived-field rules
//!
//! Fields that are not plain columns of the row they appear on:
//! - `ensemble` / `allEnsembles` roots
//! - `Ensemble.parent` and `Ensemble.updateSource` through the `updates` table
//! - `Response.name` / `Parameter.name` from their definitions
//! - `ResponseDefinition.observations` (and the reverse) through the link table
//! - `ParameterPrior` argument arrays
//!
//! Every rule reads through the [`Session`] and writes nothing.

use std::collections::HashMap;
use crate::entity::{
    Ensemble, Entity, Observation, ObservationResponseDefinitionLink, Parameter,
    ParameterDefinition, ParameterPrior, Response, ResponseDefinition, Update,
};
use crate::query::Session;
use crate::storage::Filter;
use crate::{Error, Result};

/// Root `ensemble(id)`: absence is `None`, not an error
pub fn ensemble(session: &Session, id: i64) -> Result<Option<Ensemble>> {
    session.entities().get_by_id::<Ensemble>(id)
}

/// Root `allEnsembles`, ordered by id
pub fn all_ensembles(session: &Session) -> Result<Vec<Ensemble>> {
    session.entities().filter::<Ensemble>(&Filter::All)
}

/// Rows of `T` whose `column` points at `owner_id`
pub fn owned_by<T: Entity>(session: &Session, column: &'static str, owner_id: i64) -> Result<Vec<T>> {
    session.entities().filter::<T>(&Filter::Eq(column, owner_id))
}

/// The update that produced `ensemble`, if any
pub fn parent(session: &Session, ensemble: &Ensemble) -> Result<Option<Update>> {
    let updates = owned_by::<Update>(session, "ensemble_result_id", ensemble.id)?;
    Ok(updates.into_iter().next())
}

/// Name of the ensemble `ensemble` was updated from, `None` without a parent
pub fn update_source(session: &Session, ensemble: &Ensemble) -> Result<Option<String>> {
    match parent(session, ensemble)? {
        Some(update) => {
            let source = session.require::<Ensemble>(update.ensemble_reference_id)?;
            Ok(Some(source.name))
        }
        None => Ok(None),
    }
}

/// A response is named by its definition
pub fn response_name(session: &Session, response: &Response) -> Result<String> {
    let definition = session.require::<ResponseDefinition>(response.response_definition_id)?;
    Ok(definition.name)
}

/// A parameter is named by its definition
pub fn parameter_name(session: &Session, parameter: &Parameter) -> Result<String> {
    let definition = session.require::<ParameterDefinition>(parameter.parameter_definition_id)?;
    Ok(definition.name)
}

/// Observations linked to a response definition.
///
/// One observation per link row, in link order. Duplicate link rows yield
/// duplicate observations.
pub fn observations(session: &Session, definition_id: i64) -> Result<Vec<Observation>> {
    let links = owned_by::<ObservationResponseDefinitionLink>(
        session,
        "response_definition_id",
        definition_id,
    )?;
    let ids: Vec<i64> = links.iter().map(|link| link.observation_id).collect();
    let targets = batch_fetch::<Observation>(session, ids)?;

    links
        .iter()
        .map(|link| {
            targets.get(&link.observation_id).cloned().ok_or_else(|| {
                tracing::warn!(
                    "Link {} points at missing observation {}",
                    link.id,
                    link.observation_id
                );
                Error::NotFound(format!("{} {}", Observation::NAME, link.observation_id))
            })
        })
        .collect()
}

/// Response definitions linked to an observation, in link order
pub fn response_definitions(session: &Session, observation_id: i64) -> Result<Vec<ResponseDefinition>> {
    let links = owned_by::<ObservationResponseDefinitionLink>(
        session,
        "observation_id",
        observation_id,
    )?;
    let ids: Vec<i64> = links.iter().map(|link| link.response_definition_id).collect();
    let targets = batch_fetch::<ResponseDefinition>(session, ids)?;

    links
        .iter()
        .map(|link| {
            targets.get(&link.response_definition_id).cloned().ok_or_else(|| {
                tracing::warn!(
                    "Link {} points at missing response definition {}",
                    link.id,
                    link.response_definition_id
                );
                Error::NotFound(format!(
                    "{} {}",
                    ResponseDefinition::NAME,
                    link.response_definition_id
                ))
            })
        })
        .collect()
}

fn batch_fetch<T: Entity>(session: &Session, mut ids: Vec<i64>) -> Result<HashMap<i64, T>> {
    ids.sort_unstable();
    ids.dedup();
    let rows = session.entities().filter::<T>(&Filter::In("id", ids))?;
    Ok(rows.into_iter().map(|row| (row.id(), row)).collect())
}

/// Argument names of a prior
pub fn prior_names(prior: &ParameterPrior) -> Result<Vec<String>> {
    serde_json::from_str(&prior.parameter_names).map_err(|e| {
        Error::Decode(format!("parameter_names of prior {}: {}", prior.id, e))
    })
}

/// Argument values of a prior
pub fn prior_values(prior: &ParameterPrior) -> Result<Vec<f64>> {
    serde_json::from_str(&prior.parameter_values).map_err(|e| {
        Error::Decode(format!("parameter_values of prior {}: {}", prior.id, e))
    })
}

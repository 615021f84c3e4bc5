//! Entity rows - the stored shape of every relational table
//!
//! Rows carry their scalar columns directly and their blob-backed columns as
//! [`BlobRef`]s. Nothing here touches the blob store; the public accessors
//! for blob-backed and derived fields live in the query layer.
//!
//! Ownership graph:
//! - `Project` → `Ensemble` → `Realization`, `ResponseDefinition`, `ParameterDefinition`
//! - `ResponseDefinition` → `Response`; `ParameterDefinition` → `Parameter`, `ParameterPrior`
//! - `Observation` ↔ `ResponseDefinition` through `ObservationResponseDefinitionLink`
//! - `Update`: `ensemble_reference` (source) → `ensemble_result`

use crate::reference::BlobRef;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A table-backed entity with a durable integer identity.
pub trait Entity: Sized {
    /// Type name shown to query clients
    const NAME: &'static str;
    /// Backing table
    const TABLE: &'static str;
    /// Selected columns, in the order `from_row` reads them
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    fn id(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

impl Entity for Project {
    const NAME: &'static str = "Project";
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// A named collection of realizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    pub id: i64,
    pub name: String,
    /// Creation timestamp as written by ingestion
    pub time_created: Option<String>,
    pub project_id: Option<i64>,
}

impl Entity for Ensemble {
    const NAME: &'static str = "Ensemble";
    const TABLE: &'static str = "ensembles";
    const COLUMNS: &'static [&'static str] = &["id", "name", "time_created", "project_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            time_created: row.get(2)?,
            project_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// A transformation step producing `ensemble_result` from `ensemble_reference`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub algorithm: String,
    pub ensemble_reference_id: i64,
    pub ensemble_result_id: i64,
}

impl Entity for Update {
    const NAME: &'static str = "Update";
    const TABLE: &'static str = "updates";
    const COLUMNS: &'static [&'static str] =
        &["id", "algorithm", "ensemble_reference_id", "ensemble_result_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            algorithm: row.get(1)?,
            ensemble_reference_id: row.get(2)?,
            ensemble_result_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realization {
    pub id: i64,
    pub index: i64,
    pub ensemble_id: i64,
}

impl Entity for Realization {
    const NAME: &'static str = "Realization";
    const TABLE: &'static str = "realizations";
    const COLUMNS: &'static [&'static str] = &["id", "index", "ensemble_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            index: row.get(1)?,
            ensemble_id: row.get(2)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Shape of a response time series within an ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    pub id: i64,
    pub name: String,
    /// Index axis, `Int` payload
    pub indexes_ref: BlobRef,
    pub ensemble_id: i64,
}

impl Entity for ResponseDefinition {
    const NAME: &'static str = "ResponseDefinition";
    const TABLE: &'static str = "response_definitions";
    const COLUMNS: &'static [&'static str] = &["id", "name", "indexes_ref", "ensemble_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            indexes_ref: BlobRef(row.get(2)?),
            ensemble_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// One realization's instance of a response definition.
///
/// Has no name column: its name is the definition's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    /// `Float` payload
    pub values_ref: BlobRef,
    pub realization_id: i64,
    pub response_definition_id: i64,
}

impl Entity for Response {
    const NAME: &'static str = "Response";
    const TABLE: &'static str = "responses";
    const COLUMNS: &'static [&'static str] =
        &["id", "values_ref", "realization_id", "response_definition_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            values_ref: BlobRef(row.get(1)?),
            realization_id: row.get(2)?,
            response_definition_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// An observed data series. Each series is a separate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub name: String,
    pub key_indexes_ref: BlobRef,
    pub data_indexes_ref: BlobRef,
    pub values_ref: BlobRef,
    pub stds_ref: BlobRef,
}

impl Entity for Observation {
    const NAME: &'static str = "Observation";
    const TABLE: &'static str = "observations";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "key_indexes_ref",
        "data_indexes_ref",
        "values_ref",
        "stds_ref",
    ];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            key_indexes_ref: BlobRef(row.get(2)?),
            data_indexes_ref: BlobRef(row.get(3)?),
            values_ref: BlobRef(row.get(4)?),
            stds_ref: BlobRef(row.get(5)?),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Join row between an observation and a response definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationResponseDefinitionLink {
    pub id: i64,
    pub observation_id: i64,
    pub response_definition_id: i64,
}

impl Entity for ObservationResponseDefinitionLink {
    const NAME: &'static str = "ObservationResponseDefinitionLink";
    const TABLE: &'static str = "observation_response_definition_links";
    const COLUMNS: &'static [&'static str] = &["id", "observation_id", "response_definition_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            observation_id: row.get(1)?,
            response_definition_id: row.get(2)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub ensemble_id: i64,
}

impl Entity for ParameterDefinition {
    const NAME: &'static str = "ParameterDefinition";
    const TABLE: &'static str = "parameter_definitions";
    const COLUMNS: &'static [&'static str] = &["id", "name", "group", "ensemble_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            group: row.get(2)?,
            ensemble_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// One realization's value of a parameter definition. Named by its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: i64,
    /// Single-element `Float` payload
    pub value_ref: BlobRef,
    pub realization_id: i64,
    pub parameter_definition_id: i64,
}

impl Entity for Parameter {
    const NAME: &'static str = "Parameter";
    const TABLE: &'static str = "parameters";
    const COLUMNS: &'static [&'static str] =
        &["id", "value_ref", "realization_id", "parameter_definition_id"];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            value_ref: BlobRef(row.get(1)?),
            realization_id: row.get(2)?,
            parameter_definition_id: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Prior distribution of a parameter definition.
///
/// `parameter_names` and `parameter_values` are JSON arrays paired by position,
/// e.g. `["MIN", "MAX"]` / `[0.1, 0.9]` for a `UNIFORM` prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPrior {
    pub id: i64,
    pub function: String,
    pub parameter_names: String,
    pub parameter_values: String,
    pub parameter_definition_id: i64,
}

impl Entity for ParameterPrior {
    const NAME: &'static str = "ParameterPrior";
    const TABLE: &'static str = "parameter_priors";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "function",
        "parameter_names",
        "parameter_values",
        "parameter_definition_id",
    ];

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            function: row.get(1)?,
            parameter_names: row.get(2)?,
            parameter_values: row.get(3)?,
            parameter_definition_id: row.get(4)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

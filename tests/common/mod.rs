//! Provisions an entity store and a blob store on disk and seeds them with rows.

#![allow(dead_code)]

use ensemble_graph::reference::{encode_floats, encode_ints};
use ensemble_graph::storage::schema;
use ensemble_graph::{BlobRef, GraphConfig, QueryEngine, Request, Response, Session};
use rusqlite::{params, Connection};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub config: GraphConfig,
    pub entities: Connection,
    pub blobs: Connection,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = GraphConfig::new(dir.path().join("entities.db"), dir.path().join("blobs.db"));

        let entities = Connection::open(&config.entity_store).unwrap();
        schema::initialize_entity_schema(&entities).unwrap();
        // Seeding may write rows with dangling ids to model an inconsistent store
        entities.execute_batch("PRAGMA foreign_keys = OFF").unwrap();
        let blobs = Connection::open(&config.blob_store).unwrap();
        schema::initialize_blob_schema(&blobs).unwrap();

        Self { dir, config, entities, blobs }
    }

    pub fn session(&self) -> Session {
        Session::open(&self.config).unwrap()
    }

    /// Run a query in a fresh session
    pub fn query(&self, query: &str) -> Response {
        self.execute(&Request::new(query))
    }

    pub fn execute(&self, request: &Request) -> Response {
        let session = self.session();
        QueryEngine::new(&session).execute(request)
    }

    // ========== Blobs ==========

    pub fn put_blob(&self, data: &[u8]) -> BlobRef {
        self.blobs.execute("INSERT INTO blobs (data) VALUES (?1)", params![data]).unwrap();
        BlobRef(self.blobs.last_insert_rowid())
    }

    pub fn put_floats(&self, values: &[f64]) -> BlobRef {
        self.put_blob(&encode_floats(values))
    }

    pub fn put_ints(&self, values: &[i64]) -> BlobRef {
        self.put_blob(&encode_ints(values))
    }

    /// A reference that was never written
    pub fn missing_blob(&self) -> BlobRef {
        BlobRef(999_999)
    }

    // ========== Entities ==========

    fn insert(&self, sql: &str, values: &[&dyn rusqlite::ToSql]) -> i64 {
        self.entities.execute(sql, values).unwrap();
        self.entities.last_insert_rowid()
    }

    pub fn project(&self, name: &str) -> i64 {
        self.insert("INSERT INTO projects (name) VALUES (?1)", params![name])
    }

    pub fn ensemble(&self, name: &str, project_id: Option<i64>) -> i64 {
        self.insert(
            "INSERT INTO ensembles (name, time_created, project_id) VALUES (?1, '2020-01-01T00:00:00', ?2)",
            params![name, project_id],
        )
    }

    pub fn update(&self, algorithm: &str, reference_id: i64, result_id: i64) -> i64 {
        self.insert(
            "INSERT INTO updates (algorithm, ensemble_reference_id, ensemble_result_id) VALUES (?1, ?2, ?3)",
            params![algorithm, reference_id, result_id],
        )
    }

    pub fn realization(&self, ensemble_id: i64, index: i64) -> i64 {
        self.insert(
            "INSERT INTO realizations (\"index\", ensemble_id) VALUES (?1, ?2)",
            params![index, ensemble_id],
        )
    }

    pub fn response_definition(&self, ensemble_id: i64, name: &str, indexes_ref: BlobRef) -> i64 {
        self.insert(
            "INSERT INTO response_definitions (name, indexes_ref, ensemble_id) VALUES (?1, ?2, ?3)",
            params![name, indexes_ref.id(), ensemble_id],
        )
    }

    pub fn response(&self, realization_id: i64, definition_id: i64, values_ref: BlobRef) -> i64 {
        self.insert(
            "INSERT INTO responses (values_ref, realization_id, response_definition_id) VALUES (?1, ?2, ?3)",
            params![values_ref.id(), realization_id, definition_id],
        )
    }

    pub fn observation(
        &self,
        name: &str,
        key_indexes_ref: BlobRef,
        data_indexes_ref: BlobRef,
        values_ref: BlobRef,
        stds_ref: BlobRef,
    ) -> i64 {
        self.insert(
            "INSERT INTO observations (name, key_indexes_ref, data_indexes_ref, values_ref, stds_ref) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                key_indexes_ref.id(),
                data_indexes_ref.id(),
                values_ref.id(),
                stds_ref.id()
            ],
        )
    }

    /// An observation whose four series are stored as separate blobs
    pub fn simple_observation(&self, name: &str, values: &[f64]) -> i64 {
        let indexes: Vec<i64> = (0..values.len() as i64).collect();
        let stds = vec![0.1; values.len()];
        self.observation(
            name,
            self.put_ints(&indexes),
            self.put_ints(&indexes),
            self.put_floats(values),
            self.put_floats(&stds),
        )
    }

    pub fn link(&self, observation_id: i64, definition_id: i64) -> i64 {
        self.insert(
            "INSERT INTO observation_response_definition_links (observation_id, response_definition_id) VALUES (?1, ?2)",
            params![observation_id, definition_id],
        )
    }

    pub fn parameter_definition(&self, ensemble_id: i64, name: &str, group: &str) -> i64 {
        self.insert(
            "INSERT INTO parameter_definitions (name, \"group\", ensemble_id) VALUES (?1, ?2, ?3)",
            params![name, group, ensemble_id],
        )
    }

    pub fn parameter(&self, realization_id: i64, definition_id: i64, value_ref: BlobRef) -> i64 {
        self.insert(
            "INSERT INTO parameters (value_ref, realization_id, parameter_definition_id) VALUES (?1, ?2, ?3)",
            params![value_ref.id(), realization_id, definition_id],
        )
    }

    pub fn prior(&self, definition_id: i64, function: &str, names: &str, values: &str) -> i64 {
        self.insert(
            "INSERT INTO parameter_priors (function, parameter_names, parameter_values, parameter_definition_id) VALUES (?1, ?2, ?3, ?4)",
            params![function, names, values, definition_id],
        )
    }
}

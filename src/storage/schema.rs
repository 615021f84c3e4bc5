//! Database schema definitions
//!
//! The query layer only reads these tables. The statements are published for
//! the ingestion side and for provisioning test databases.

/// SQL to create the projects table
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the ensembles table
pub const CREATE_ENSEMBLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ensembles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    time_created TEXT,
    project_id INTEGER REFERENCES projects(id)
)
"#;

/// SQL to create the updates table
/// An ensemble is the result of at most one update
pub const CREATE_UPDATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS updates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    algorithm TEXT NOT NULL,
    ensemble_reference_id INTEGER NOT NULL REFERENCES ensembles(id),
    ensemble_result_id INTEGER NOT NULL UNIQUE REFERENCES ensembles(id)
)
"#;

/// SQL to create the realizations table
pub const CREATE_REALIZATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS realizations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    "index" INTEGER NOT NULL,
    ensemble_id INTEGER NOT NULL REFERENCES ensembles(id)
)
"#;

/// SQL to create the response_definitions table
pub const CREATE_RESPONSE_DEFINITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS response_definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    indexes_ref INTEGER NOT NULL,
    ensemble_id INTEGER NOT NULL REFERENCES ensembles(id)
)
"#;

/// SQL to create the responses table
pub const CREATE_RESPONSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    values_ref INTEGER NOT NULL,
    realization_id INTEGER NOT NULL REFERENCES realizations(id),
    response_definition_id INTEGER NOT NULL REFERENCES response_definitions(id)
)
"#;

/// SQL to create the observations table
pub const CREATE_OBSERVATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    key_indexes_ref INTEGER NOT NULL,
    data_indexes_ref INTEGER NOT NULL,
    values_ref INTEGER NOT NULL,
    stds_ref INTEGER NOT NULL
)
"#;

/// SQL to create the observation/response-definition link table
/// Pairs are not unique: the join reports whatever cardinality is stored
pub const CREATE_OBSERVATION_LINKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS observation_response_definition_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    observation_id INTEGER NOT NULL REFERENCES observations(id),
    response_definition_id INTEGER NOT NULL REFERENCES response_definitions(id)
)
"#;

/// SQL to create the parameter_definitions table
pub const CREATE_PARAMETER_DEFINITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS parameter_definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    "group" TEXT NOT NULL DEFAULT '',
    ensemble_id INTEGER NOT NULL REFERENCES ensembles(id)
)
"#;

/// SQL to create the parameters table
pub const CREATE_PARAMETERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS parameters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value_ref INTEGER NOT NULL,
    realization_id INTEGER NOT NULL REFERENCES realizations(id),
    parameter_definition_id INTEGER NOT NULL REFERENCES parameter_definitions(id)
)
"#;

/// SQL to create the parameter_priors table
pub const CREATE_PARAMETER_PRIORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS parameter_priors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    function TEXT NOT NULL,
    parameter_names TEXT NOT NULL DEFAULT '[]',
    parameter_values TEXT NOT NULL DEFAULT '[]',
    parameter_definition_id INTEGER NOT NULL REFERENCES parameter_definitions(id)
)
"#;

/// SQL to create indexes over the foreign-key columns the resolvers filter on
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_ensembles_project ON ensembles(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_updates_reference ON updates(ensemble_reference_id)",
    "CREATE INDEX IF NOT EXISTS idx_realizations_ensemble ON realizations(ensemble_id)",
    "CREATE INDEX IF NOT EXISTS idx_response_definitions_ensemble ON response_definitions(ensemble_id)",
    "CREATE INDEX IF NOT EXISTS idx_responses_realization ON responses(realization_id)",
    "CREATE INDEX IF NOT EXISTS idx_responses_definition ON responses(response_definition_id)",
    "CREATE INDEX IF NOT EXISTS idx_links_observation ON observation_response_definition_links(observation_id)",
    "CREATE INDEX IF NOT EXISTS idx_links_definition ON observation_response_definition_links(response_definition_id)",
    "CREATE INDEX IF NOT EXISTS idx_parameter_definitions_ensemble ON parameter_definitions(ensemble_id)",
    "CREATE INDEX IF NOT EXISTS idx_parameters_realization ON parameters(realization_id)",
    "CREATE INDEX IF NOT EXISTS idx_parameters_definition ON parameters(parameter_definition_id)",
    "CREATE INDEX IF NOT EXISTS idx_priors_definition ON parameter_priors(parameter_definition_id)",
];

/// SQL to create the blobs table (blob store database)
pub const CREATE_BLOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS blobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data BLOB NOT NULL
)
"#;

/// All entity store schema statements
pub fn entity_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PROJECTS_TABLE,
        CREATE_ENSEMBLES_TABLE,
        CREATE_UPDATES_TABLE,
        CREATE_REALIZATIONS_TABLE,
        CREATE_RESPONSE_DEFINITIONS_TABLE,
        CREATE_RESPONSES_TABLE,
        CREATE_OBSERVATIONS_TABLE,
        CREATE_OBSERVATION_LINKS_TABLE,
        CREATE_PARAMETER_DEFINITIONS_TABLE,
        CREATE_PARAMETERS_TABLE,
        CREATE_PARAMETER_PRIORS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// All blob store schema statements
pub fn blob_schema_statements() -> Vec<&'static str> {
    vec![CREATE_BLOBS_TABLE]
}

/// Create the entity tables on a writable connection
pub fn initialize_entity_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    for stmt in entity_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

/// Create the blob table on a writable connection
pub fn initialize_blob_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    for stmt in blob_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

//! SQLite entity store - read-only lookups over the relational model

use std::path::Path;
use std::time::Duration;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use crate::entity::{
    Ensemble, Entity, Observation, ObservationResponseDefinitionLink, Parameter,
    ParameterDefinition, ParameterPrior, Project, Realization, Response, ResponseDefinition,
    Update,
};
use crate::{Error, Result};

/// Upper bound on bound parameters per `IN` query
const MAX_IN_PARAMS: usize = 500;

/// Row predicate for [`EntityStore::filter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every row of the table
    All,
    /// `column = value`
    Eq(&'static str, i64),
    /// `column IN (values)`
    In(&'static str, Vec<i64>),
}

impl Filter {
    fn column(&self) -> Option<&'static str> {
        match self {
            Filter::All => None,
            Filter::Eq(column, _) | Filter::In(column, _) => Some(column),
        }
    }
}

/// Read-only access to the entity tables.
///
/// Blob-backed columns come back as [`crate::BlobRef`]s and are never
/// decoded here.
pub struct EntityStore {
    conn: Connection,
}

impl EntityStore {
    /// Open the entity database read-only
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = super::open_read_only(path, busy_timeout)?;
        tracing::debug!("Opened entity store {}", path.display());
        Ok(Self { conn })
    }

    /// Wrap an already opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Start a deferred read transaction so that every subsequent lookup on
    /// this store sees one snapshot. It ends when the store is dropped.
    pub fn begin_snapshot(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN DEFERRED")?;
        Ok(())
    }

    /// Look up one entity by id
    pub fn get_by_id<T: Entity>(&self, id: i64) -> Result<Option<T>> {
        let sql = select_sql::<T>("WHERE id = ?1");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.query_row([id], T::from_row)
            .optional()
            .map_err(Into::into)
    }

    /// All entities matching `filter`, ordered by id
    pub fn filter<T: Entity>(&self, filter: &Filter) -> Result<Vec<T>> {
        if let Some(column) = filter.column() {
            if !T::COLUMNS.contains(&column) {
                return Err(Error::Query(format!(
                    "unknown column {} on {}",
                    column,
                    T::TABLE
                )));
            }
        }

        match filter {
            Filter::All => self.query::<T>("", &[]),
            Filter::Eq(column, value) => {
                self.query::<T>(&format!("WHERE \"{}\" = ?1", column), &[*value])
            }
            Filter::In(column, values) => {
                let mut rows = Vec::new();
                for chunk in values.chunks(MAX_IN_PARAMS) {
                    let placeholders = (1..=chunk.len())
                        .map(|i| format!("?{}", i))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let clause = format!("WHERE \"{}\" IN ({})", column, placeholders);
                    rows.extend(self.query::<T>(&clause, chunk)?);
                }
                if values.len() > MAX_IN_PARAMS {
                    rows.sort_by_key(|row| row.id());
                }
                Ok(rows)
            }
        }
    }

    fn query<T: Entity>(&self, clause: &str, values: &[i64]) -> Result<Vec<T>> {
        let sql = select_sql::<T>(clause);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), T::from_row)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }

    /// Count the rows of an entity table
    pub fn count<T: Entity>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts of every entity table
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            projects: self.count::<Project>()?,
            ensembles: self.count::<Ensemble>()?,
            updates: self.count::<Update>()?,
            realizations: self.count::<Realization>()?,
            response_definitions: self.count::<ResponseDefinition>()?,
            responses: self.count::<Response>()?,
            observations: self.count::<Observation>()?,
            observation_links: self.count::<ObservationResponseDefinitionLink>()?,
            parameter_definitions: self.count::<ParameterDefinition>()?,
            parameters: self.count::<Parameter>()?,
            parameter_priors: self.count::<ParameterPrior>()?,
        })
    }
}

fn select_sql<T: Entity>(clause: &str) -> String {
    let columns = T::COLUMNS
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {} FROM {} {} ORDER BY id", columns, T::TABLE, clause)
}

/// Entity store statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub projects: usize,
    pub ensembles: usize,
    pub updates: usize,
    pub realizations: usize,
    pub response_definitions: usize,
    pub responses: usize,
    pub observations: usize,
    pub observation_links: usize,
    pub parameter_definitions: usize,
    pub parameters: usize,
    pub parameter_priors: usize,
}

impl StoreStats {
    /// Label/count pairs in display order
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Projects", self.projects),
            ("Ensembles", self.ensembles),
            ("Updates", self.updates),
            ("Realizations", self.realizations),
            ("Response definitions", self.response_definitions),
            ("Responses", self.responses),
            ("Observations", self.observations),
            ("Observation links", self.observation_links),
            ("Parameter definitions", self.parameter_definitions),
            ("Parameters", self.parameters),
            ("Parameter priors", self.parameter_priors),
        ]
    }
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Entity Store Statistics:")?;
        for (label, count) in self.rows() {
            writeln!(f, "  {}: {}", label, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;

    fn store_with(sql: &str) -> EntityStore {
        let conn = Connection::open_in_memory().unwrap();
        schema::initialize_entity_schema(&conn).unwrap();
        conn.execute_batch(sql).unwrap();
        EntityStore::from_connection(conn)
    }

    #[test]
    fn test_get_by_id() {
        let store = store_with(
            "INSERT INTO ensembles (id, name, time_created) VALUES (1, 'prior', '2020-01-01T00:00:00');",
        );

        let ensemble = store.get_by_id::<Ensemble>(1).unwrap().unwrap();
        assert_eq!(ensemble.name, "prior");
        assert_eq!(ensemble.project_id, None);
        assert!(store.get_by_id::<Ensemble>(2).unwrap().is_none());
    }

    #[test]
    fn test_filter_is_ordered_by_id() {
        let store = store_with(
            "INSERT INTO ensembles (id, name) VALUES (1, 'prior');
             INSERT INTO realizations (id, \"index\", ensemble_id) VALUES (7, 2, 1);
             INSERT INTO realizations (id, \"index\", ensemble_id) VALUES (3, 0, 1);
             INSERT INTO realizations (id, \"index\", ensemble_id) VALUES (5, 1, 1);",
        );

        let filter = Filter::Eq("ensemble_id", 1);
        let first: Vec<i64> = store.filter::<Realization>(&filter).unwrap().iter().map(|r| r.id).collect();
        let second: Vec<i64> = store.filter::<Realization>(&filter).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(first, vec![3, 5, 7]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_in() {
        let store = store_with(
            "INSERT INTO projects (id, name) VALUES (1, 'a'), (2, 'b'), (3, 'c');",
        );

        let projects = store.filter::<Project>(&Filter::In("id", vec![3, 1, 3])).unwrap();
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);

        assert!(store.filter::<Project>(&Filter::In("id", vec![])).unwrap().is_empty());
    }

    #[test]
    fn test_filter_rejects_unknown_column() {
        let store = store_with("");
        let err = store.filter::<Project>(&Filter::Eq("owner", 1)).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn test_reserved_word_columns() {
        let store = store_with(
            "INSERT INTO ensembles (id, name) VALUES (1, 'prior');
             INSERT INTO parameter_definitions (id, name, \"group\", ensemble_id) VALUES (1, 'PORO', 'FIELD', 1);",
        );

        let definition = store.get_by_id::<ParameterDefinition>(1).unwrap().unwrap();
        assert_eq!(definition.group, "FIELD");
    }

    #[test]
    fn test_stats() {
        let store = store_with(
            "INSERT INTO ensembles (id, name) VALUES (1, 'prior'), (2, 'posterior');
             INSERT INTO updates (algorithm, ensemble_reference_id, ensemble_result_id) VALUES ('es', 1, 2);",
        );

        let stats = store.stats().unwrap();
        assert_eq!(stats.ensembles, 2);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.responses, 0);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = EntityStore::open(&dir.path().join("absent.db"), Duration::from_millis(10));
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }
}

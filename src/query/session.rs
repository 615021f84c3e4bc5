//! Per-execution context
//!
//! A [`Session`] owns one connection to each store for the duration of a
//! single query execution and is handed to every resolver. Dropping it
//! releases both connections and ends the entity snapshot.

use crate::config::GraphConfig;
use crate::entity::Entity;
use crate::query::resolver::ReferenceResolver;
use crate::storage::{BlobStore, EntityStore};
use crate::{Error, Result};

pub struct Session {
    entities: EntityStore,
    references: ReferenceResolver,
}

impl Session {
    /// Open both stores from configuration and pin an entity snapshot
    pub fn open(config: &GraphConfig) -> Result<Self> {
        let entities = EntityStore::open(&config.entity_store, config.busy_timeout())?;
        entities.begin_snapshot()?;
        let blobs = BlobStore::open(&config.blob_store, config.busy_timeout())?;
        tracing::debug!("Session opened");
        Ok(Self::new(entities, blobs))
    }

    /// Build a session over already opened stores
    pub fn new(entities: EntityStore, blobs: BlobStore) -> Self {
        Self {
            entities,
            references: ReferenceResolver::new(blobs),
        }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn references(&self) -> &ReferenceResolver {
        &self.references
    }

    /// Look up an entity that another row points at.
    ///
    /// A missing row means the stored graph is inconsistent, so absence is an
    /// error here rather than `None`.
    pub fn require<T: Entity>(&self, id: i64) -> Result<T> {
        match self.entities.get_by_id::<T>(id)? {
            Some(entity) => Ok(entity),
            None => {
                tracing::warn!("Dangling reference to {} {}", T::NAME, id);
                Err(Error::NotFound(format!("{} {}", T::NAME, id)))
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!("Session closed after {} blob fetches", self.references.fetched());
    }
}

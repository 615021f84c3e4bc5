//! Reference resolver - turns blob references into numeric arrays
//!
//! Payloads are immutable, so every fetched payload is memoized for the
//! lifetime of the resolver (one query execution).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use crate::Result;
use crate::reference::{self, BlobRef, ElementType, NumericArray};
use crate::storage::BlobStore;

pub struct ReferenceResolver {
    blobs: BlobStore,
    memo: RefCell<HashMap<BlobRef, Rc<[u8]>>>,
}

impl ReferenceResolver {
    pub fn new(blobs: BlobStore) -> Self {
        Self {
            blobs,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Decode the payload behind `reference` as `element_type`
    pub fn resolve(&self, reference: BlobRef, element_type: ElementType) -> Result<NumericArray> {
        let bytes = self.fetch(reference)?;
        reference::decode(&bytes, element_type)
    }

    pub fn resolve_floats(&self, reference: BlobRef) -> Result<Vec<f64>> {
        let bytes = self.fetch(reference)?;
        reference::decode_floats(&bytes)
    }

    pub fn resolve_ints(&self, reference: BlobRef) -> Result<Vec<i64>> {
        let bytes = self.fetch(reference)?;
        reference::decode_ints(&bytes)
    }

    /// Decode a single-element float payload
    pub fn resolve_scalar(&self, reference: BlobRef) -> Result<f64> {
        let bytes = self.fetch(reference)?;
        reference::decode_scalar(&bytes)
    }

    /// Number of distinct payloads fetched so far
    pub fn fetched(&self) -> usize {
        self.memo.borrow().len()
    }

    fn fetch(&self, reference: BlobRef) -> Result<Rc<[u8]>> {
        if let Some(bytes) = self.memo.borrow().get(&reference) {
            return Ok(Rc::clone(bytes));
        }

        let bytes: Rc<[u8]> = self.blobs.fetch(reference)?.into();
        tracing::debug!("Fetched {} ({} bytes)", reference, bytes.len());
        self.memo.borrow_mut().insert(reference, Rc::clone(&bytes));
        Ok(bytes)
    }
}

//! Blob references and the packed numeric payload format
//!
//! A blob-backed column holds a [`BlobRef`]: the integer key of a row in the
//! blob store. The payload behind it is a packed little-endian array of
//! 8-byte elements with no header:
//! - `Float` payloads hold `f64` values
//! - `Int` payloads hold `i64` values

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Width in bytes of one packed element
pub const ELEMENT_WIDTH: usize = 8;

/// Opaque key of a payload in the blob store.
///
/// Stable and never reused for different content, so payloads fetched
/// through it can be cached indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub i64);

impl BlobRef {
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Element type a payload is decoded as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float,
    Int,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Float => "float",
            ElementType::Int => "int",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericArray {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

impl NumericArray {
    pub fn len(&self) -> usize {
        match self {
            NumericArray::Float(values) => values.len(),
            NumericArray::Int(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a packed payload as `element_type`.
pub fn decode(bytes: &[u8], element_type: ElementType) -> Result<NumericArray> {
    match element_type {
        ElementType::Float => decode_floats(bytes).map(NumericArray::Float),
        ElementType::Int => decode_ints(bytes).map(NumericArray::Int),
    }
}

pub fn decode_floats(bytes: &[u8]) -> Result<Vec<f64>> {
    Ok(words(bytes, ElementType::Float)?.map(f64::from_le_bytes).collect())
}

pub fn decode_ints(bytes: &[u8]) -> Result<Vec<i64>> {
    Ok(words(bytes, ElementType::Int)?.map(i64::from_le_bytes).collect())
}

/// Decode a payload that must hold exactly one float.
pub fn decode_scalar(bytes: &[u8]) -> Result<f64> {
    match decode_floats(bytes)?.as_slice() {
        [value] => Ok(*value),
        values => Err(Error::Decode(format!(
            "expected a single float, payload holds {} elements",
            values.len()
        ))),
    }
}

fn words(
    bytes: &[u8],
    element_type: ElementType,
) -> Result<impl Iterator<Item = [u8; ELEMENT_WIDTH]> + '_> {
    if bytes.len() % ELEMENT_WIDTH != 0 {
        return Err(Error::Decode(format!(
            "payload of {} bytes is not a packed {} array",
            bytes.len(),
            element_type
        )));
    }

    Ok(bytes.chunks_exact(ELEMENT_WIDTH).map(|chunk| {
        let mut word = [0u8; ELEMENT_WIDTH];
        word.copy_from_slice(chunk);
        word
    }))
}

/// Pack floats in the payload layout (used by ingestion and tests)
pub fn encode_floats(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Pack integers in the payload layout (used by ingestion and tests)
pub fn encode_ints(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

//! # Canonical Serialization: JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes that are
//! hashed into certificate commitments.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only constructors are
//! [`CanonicalBytes::new()`] and [`CanonicalBytes::from_value()`], both of
//! which apply the coercion rules below before RFC 8785 serialization. Any
//! function that hashes structured data must accept `&CanonicalBytes`, so a
//! commitment can never be computed over a non-canonical encoding.
//!
//! ## Coercion Rules
//!
//! 1. **No fractional numbers.** JCS number formatting differs across
//!    serializers for floats; certificate data never carries them. The
//!    error names the offending value by JSON pointer.
//! 2. **Keys are strings.** Guaranteed by `serde_json::Map`.
//! 3. **Datetimes are pre-rendered.** `Timestamp` serializes as
//!    `YYYY-MM-DDTHH:MM:SSZ`; nothing locale-dependent reaches the encoder.
//!
//! After coercion, `serde_jcs` produces sorted keys, compact separators and
//! UTF-8 output.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - Object keys are sorted (RFC 8785).
/// - No insignificant whitespace.
/// - No float values anywhere in the tree.
/// - Output is valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `FloatRejected` if the value contains a fractional number,
    /// `SerializationFailed` if serde cannot represent it.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        reject_floats(&value, &mut String::new())?;
        Ok(Self(serde_jcs::to_vec(&value)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reject any fractional number in the tree, naming it by JSON pointer.
fn reject_floats(value: &Value, pointer: &mut String) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => {
            Err(CanonicalizationError::FloatRejected {
                pointer: if pointer.is_empty() { "/".into() } else { pointer.clone() },
                value: n.as_f64().unwrap_or(f64::NAN),
            })
        }
        Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| {
            let len = pointer.len();
            pointer.push_str(&format!("/{i}"));
            let res = reject_floats(item, pointer);
            pointer.truncate(len);
            res
        }),
        Value::Object(map) => map.iter().try_for_each(|(key, item)| {
            let len = pointer.len();
            pointer.push('/');
            pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
            let res = reject_floats(item, pointer);
            pointer.truncate(len);
            res
        }),
        _ => Ok(()),
    }
}

//! Basic type definitions for the drawing relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `RoomId`: 6-digit zero-padded numeric room code

use rand::Rng;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe connection identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of digits in a room id
pub const ROOM_ID_WIDTH: usize = 6;

/// Largest numeric value a room id can take
pub const ROOM_ID_MAX: u32 = 999_999;

/// Room id (6 ASCII digits, zero-padded)
///
/// Generated by the registry. Ids received from clients are kept verbatim,
/// so a malformed one just never matches a live room. Clients may also send
/// the id as a JSON integer, which is zero-padded to the same width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Draw a random room id from `000000..=999999`
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let n = rng.gen_range(0..=ROOM_ID_MAX);
        Self(format!("{:0width$}", n, width = ROOM_ID_WIDTH))
    }

    /// Wrap a client-supplied id without normalization
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id has the generated shape (exactly 6 ASCII digits)
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ROOM_ID_WIDTH && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoomIdVisitor;

        impl Visitor<'_> for RoomIdVisitor {
            type Value = RoomId;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a room id string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RoomId, E> {
                Ok(RoomId::from_string(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RoomId, E> {
                Ok(RoomId(format!("{:0width$}", v, width = ROOM_ID_WIDTH)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RoomId, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Ok(RoomId(v.to_string())),
                }
            }
        }

        deserializer.deserialize_any(RoomIdVisitor)
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

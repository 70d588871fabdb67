//! Per-view CRUD grants.
//!
//! The backend encodes the grant of a permission as a 4-bit mask, MSB first:
//!
//! ```text
//! bit 3  create  (8)
//! bit 2  read    (4)
//! bit 1  update  (2)
//! bit 0  delete  (1)
//! ```
//!
//! On the wire the mask is a plain integer (sometimes a numeric string). In
//! memory it is a capability set, so callers never shift or mask by hand.
//!
//! # Example
//!
//! ```
//! use freightdesk_auth::{AccessMask, Action};
//!
//! let mask = AccessMask::from_bits_truncate(12);
//! assert!(mask.allows(Action::Create));
//! assert!(mask.allows(Action::Read));
//! assert!(!mask.allows(Action::Delete));
//! ```

use bitflags::bitflags;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

bitflags! {
    /// Create/read/update/delete grant for a single view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessMask: u8 {
        const CREATE = 0b1000;
        const READ   = 0b0100;
        const UPDATE = 0b0010;
        const DELETE = 0b0001;
    }
}

/// A single operation a view can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn flag(self) -> AccessMask {
        match self {
            Action::Create => AccessMask::CREATE,
            Action::Read => AccessMask::READ,
            Action::Update => AccessMask::UPDATE,
            Action::Delete => AccessMask::DELETE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AccessMask {
    /// Build a mask from the four CRUD booleans an editing form carries.
    pub fn from_crud(create: bool, read: bool, update: bool, delete: bool) -> Self {
        let mut mask = AccessMask::empty();
        mask.set(AccessMask::CREATE, create);
        mask.set(AccessMask::READ, read);
        mask.set(AccessMask::UPDATE, update);
        mask.set(AccessMask::DELETE, delete);
        mask
    }

    /// Decode back into `(create, read, update, delete)`.
    pub fn to_crud(self) -> (bool, bool, bool, bool) {
        (
            self.contains(AccessMask::CREATE),
            self.contains(AccessMask::READ),
            self.contains(AccessMask::UPDATE),
            self.contains(AccessMask::DELETE),
        )
    }

    pub fn allows(self, action: Action) -> bool {
        self.contains(action.flag())
    }

    /// True if any of the requested bits is granted.
    pub fn allows_any(self, requested: AccessMask) -> bool {
        self.intersects(requested)
    }
}

impl Serialize for AccessMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for AccessMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AccessMaskVisitor)
    }
}

struct AccessMaskVisitor;

impl AccessMaskVisitor {
    fn from_i64<E: de::Error>(value: i64) -> Result<AccessMask, E> {
        let bits = u8::try_from(value)
            .map_err(|_| E::custom(format!("access mask out of range: {value}")))?;
        // Bits above the CRUD nibble carry no meaning for the client.
        Ok(AccessMask::from_bits_truncate(bits))
    }
}

impl<'de> Visitor<'de> for AccessMaskVisitor {
    type Value = AccessMask;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("an integer access mask or its decimal string form")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        let value = i64::try_from(value)
            .map_err(|_| E::custom(format!("access mask out of range: {value}")))?;
        Self::from_i64(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Self::from_i64(value)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(AccessMask::empty());
        }
        let parsed = trimmed
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid access mask: {value:?}")))?;
        Self::from_i64(parsed)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(AccessMask::empty())
    }
}

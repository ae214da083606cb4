//! The bidirectional field stream.
//!
//! An [`IoPacket`] is either being written ([`Direction::Serialize`]) or read
//! ([`Direction::Deserialize`]). Callers describe their fields once:
//!
//! ```rust
//! use scene_core::{IoPacket, PacketError};
//!
//! struct Weapon {
//!     power: f32,
//!     ammo: u32,
//! }
//!
//! impl Weapon {
//!     fn stream(&mut self, packet: &mut IoPacket) -> Result<(), PacketError> {
//!         packet.stream(&mut self.power, "power")?;
//!         packet.stream_or(&mut self.ammo, "ammo", 30)
//!     }
//! }
//!
//! let mut out = IoPacket::serializing();
//! Weapon { power: 2.5, ammo: 12 }.stream(&mut out).unwrap();
//!
//! let mut back = Weapon { power: 0.0, ammo: 0 };
//! back.stream(&mut out.into_deserializing()).unwrap();
//! assert_eq!(back.power, 2.5);
//! assert_eq!(back.ammo, 12);
//! ```
//!
//! The same `stream` method saves and loads. Fields keep their insertion
//! order, so a packet written by a component always starts with its `type`
//! tag.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Which way a packet is flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Values are written into the packet.
    Serialize,
    /// Values are overwritten from the packet.
    Deserialize,
}

/// Errors raised while streaming fields.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    /// A required field was absent on read.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A field could not be converted to a packet value.
    #[error("failed to write field '{field}': {source}")]
    Encode {
        /// The field name.
        field: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A field was present but did not decode as the requested type.
    #[error("invalid field '{field}': {source}")]
    InvalidField {
        /// The field name.
        field: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A field expected to hold a list of packets held something else.
    #[error("field '{0}' is not a list of packets")]
    NotAList(String),

    /// A packet was built from a value that is not an object.
    #[error("packet root must be an object")]
    NotAnObject,

    /// A one-way operation was used against the packet's direction.
    #[error("cannot {operation} a packet in {direction:?} direction")]
    WrongDirection {
        /// The attempted operation.
        operation: &'static str,
        /// The packet's direction.
        direction: Direction,
    },

    /// The entity's own hook is running, so its hook fields cannot be
    /// streamed.
    #[error("'{0}' cannot be streamed from one of its own hooks")]
    Busy(String),
}

/// A named, ordered set of fields plus the direction they flow in.
#[derive(Debug, Clone)]
pub struct IoPacket {
    direction: Direction,
    fields: Map<String, Value>,
}

impl IoPacket {
    /// Create an empty packet flowing in `direction`.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            fields: Map::new(),
        }
    }

    /// Create an empty packet to write into.
    #[must_use]
    pub fn serializing() -> Self {
        Self::new(Direction::Serialize)
    }

    /// Create a packet that reads from `fields`.
    #[must_use]
    pub fn deserializing(fields: Map<String, Value>) -> Self {
        Self {
            direction: Direction::Deserialize,
            fields,
        }
    }

    /// Build a reading packet from a JSON object value.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::NotAnObject`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, PacketError> {
        match value {
            Value::Object(fields) => Ok(Self::deserializing(fields)),
            _ => Err(PacketError::NotAnObject),
        }
    }

    /// Consume the packet, returning its fields as a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Turn a written packet around so it can be read back.
    #[must_use]
    pub fn into_deserializing(self) -> Self {
        Self::deserializing(self.fields)
    }

    /// Returns the packet direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if values are being written.
    #[must_use]
    pub fn is_serializing(&self) -> bool {
        self.direction == Direction::Serialize
    }

    /// Returns `true` if a field with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Write `value` under `name`, or overwrite `value` from `name`.
    ///
    /// # Errors
    ///
    /// On read, [`PacketError::MissingField`] if the field is absent and
    /// [`PacketError::InvalidField`] if it does not decode as `T`. On write,
    /// [`PacketError::Encode`] if `T` cannot be represented.
    pub fn stream<T>(&mut self, value: &mut T, name: &str) -> Result<(), PacketError>
    where
        T: Serialize + DeserializeOwned,
    {
        match self.direction {
            Direction::Serialize => self.put(name, &*value),
            Direction::Deserialize => {
                *value = self.take(name)?;
                Ok(())
            }
        }
    }

    /// Like [`IoPacket::stream`], but a missing field on read assigns
    /// `default` instead of failing.
    ///
    /// # Errors
    ///
    /// See [`IoPacket::stream`].
    pub fn stream_or<T>(&mut self, value: &mut T, name: &str, default: T) -> Result<(), PacketError>
    where
        T: Serialize + DeserializeOwned,
    {
        match self.direction {
            Direction::Serialize => self.put(name, &*value),
            Direction::Deserialize if !self.contains(name) => {
                *value = default;
                Ok(())
            }
            Direction::Deserialize => {
                *value = self.take(name)?;
                Ok(())
            }
        }
    }

    /// Write a field that has no counterpart on read, such as a type tag.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::WrongDirection`] on a reading packet.
    pub fn write<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), PacketError> {
        if !self.is_serializing() {
            return Err(PacketError::WrongDirection {
                operation: "write",
                direction: self.direction,
            });
        }
        self.put(name, value)
    }

    /// Read a field without a destination to overwrite.
    ///
    /// Works in both directions, so a written packet can be inspected.
    ///
    /// # Errors
    ///
    /// See [`IoPacket::stream`].
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, PacketError> {
        self.take(name)
    }

    /// Store a list of nested packets under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::WrongDirection`] on a reading packet.
    pub fn write_packets(&mut self, name: &str, packets: Vec<IoPacket>) -> Result<(), PacketError> {
        if !self.is_serializing() {
            return Err(PacketError::WrongDirection {
                operation: "write packets into",
                direction: self.direction,
            });
        }
        let list = packets.into_iter().map(IoPacket::into_value).collect();
        self.fields.insert(name.to_string(), Value::Array(list));
        Ok(())
    }

    /// Read the nested packets stored under `name`, ready for deserializing.
    ///
    /// An absent field reads as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::NotAList`] if the field holds anything other
    /// than a list of objects.
    pub fn read_packets(&self, name: &str) -> Result<Vec<IoPacket>, PacketError> {
        let Some(value) = self.fields.get(name) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(PacketError::NotAList(name.to_string()));
        };
        items
            .iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(IoPacket::deserializing(fields.clone())),
                _ => Err(PacketError::NotAList(name.to_string())),
            })
            .collect()
    }

    fn put<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), PacketError> {
        let value = serde_json::to_value(value).map_err(|source| PacketError::Encode {
            field: name.to_string(),
            source,
        })?;
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    fn take<T: DeserializeOwned>(&self, name: &str) -> Result<T, PacketError> {
        let value = self
            .fields
            .get(name)
            .ok_or_else(|| PacketError::MissingField(name.to_string()))?;
        T::deserialize(value).map_err(|source| PacketError::InvalidField {
            field: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use scene_math::Vec3;

    use super::*;

    #[test]
    fn test_stream_writes_then_reads_back() {
        let mut out = IoPacket::serializing();
        let mut position = Vec3::new(1.0, 2.0, 3.0);
        let mut label = "crate".to_string();
        out.stream(&mut position, "position").unwrap();
        out.stream(&mut label, "label").unwrap();

        let mut back = out.into_deserializing();
        let mut position_in = Vec3::ZERO;
        let mut label_in = String::new();
        back.stream(&mut position_in, "position").unwrap();
        back.stream(&mut label_in, "label").unwrap();
        assert_eq!(position_in, position);
        assert_eq!(label_in, "crate");
    }

    #[test]
    fn test_serialize_does_not_modify_the_value() {
        let mut out = IoPacket::serializing();
        let mut count = 7u32;
        out.stream(&mut count, "count").unwrap();
        assert_eq!(count, 7);
        assert_eq!(out.read::<u32>("count").unwrap(), 7);
    }

    #[test]
    fn test_stream_or_uses_default_for_missing_field() {
        let mut input = IoPacket::deserializing(Map::new());
        let mut enabled = false;
        input.stream_or(&mut enabled, "enabled", true).unwrap();
        assert!(enabled);
    }

    #[test]
    fn test_stream_missing_field_fails() {
        let mut input = IoPacket::deserializing(Map::new());
        let mut name = String::new();
        let err = input.stream(&mut name, "name").unwrap_err();
        assert!(matches!(err, PacketError::MissingField(field) if field == "name"));
    }

    #[test]
    fn test_stream_wrong_type_fails() {
        let mut out = IoPacket::serializing();
        out.write("name", "not a number").unwrap();
        let mut input = out.into_deserializing();
        let mut number = 0u32;
        assert!(matches!(
            input.stream(&mut number, "name"),
            Err(PacketError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let mut out = IoPacket::serializing();
        out.write("type", "Mesh").unwrap();
        out.write("uuid", "x").unwrap();
        out.write("name", "n").unwrap();
        out.write("enabled", &true).unwrap();
        let names: Vec<_> = out.field_names().collect();
        assert_eq!(names, ["type", "uuid", "name", "enabled"]);
    }

    #[test]
    fn test_write_rejected_on_reading_packet() {
        let mut input = IoPacket::deserializing(Map::new());
        assert!(matches!(
            input.write("type", "Mesh"),
            Err(PacketError::WrongDirection { .. })
        ));
    }

    #[test]
    fn test_nested_packets() {
        let mut child = IoPacket::serializing();
        child.write("name", "child").unwrap();
        let mut parent = IoPacket::serializing();
        parent.write_packets("children", vec![child]).unwrap();

        let parent = IoPacket::from_value(parent.into_value()).unwrap();
        let children = parent.read_packets("children").unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].direction(), Direction::Deserialize);
        assert_eq!(children[0].read::<String>("name").unwrap(), "child");
        assert!(parent.read_packets("components").unwrap().is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(matches!(
            IoPacket::from_value(Value::Bool(true)),
            Err(PacketError::NotAnObject)
        ));
    }
}

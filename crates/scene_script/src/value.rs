//! Dynamic values exchanged with scripts.

use std::fmt;

use scene_math::{Quat, Vec3};

use crate::object::ScriptObject;

/// A value on the script side of the boundary.
#[derive(Clone, Debug, Default)]
pub enum ScriptValue {
    /// No value; what a lookup that found nothing returns.
    #[default]
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Vector(Vec3),
    Rotation(Quat),
    Object(ScriptObject),
}

impl ScriptValue {
    /// Short label for the value's type, used in error messages.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Vector(_) => "vector",
            Self::Rotation(_) => "rotation",
            Self::Object(_) => "object",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Number(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_vector(&self) -> Option<Vec3> {
        match *self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_rotation(&self) -> Option<Quat> {
        match *self {
            Self::Rotation(q) => Some(q),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Rotation(q) => write!(f, "({}, {}, {}, {})", q.x, q.y, q.z, q.w),
            Self::Object(o) => write!(f, "[{}]", o.class_name()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec3> for ScriptValue {
    fn from(v: Vec3) -> Self {
        Self::Vector(v)
    }
}

impl From<Quat> for ScriptValue {
    fn from(q: Quat) -> Self {
        Self::Rotation(q)
    }
}

impl From<ScriptObject> for ScriptValue {
    fn from(o: ScriptObject) -> Self {
        Self::Object(o)
    }
}

impl<T: Into<ScriptValue>> From<Option<T>> for ScriptValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Undefined, Into::into)
    }
}

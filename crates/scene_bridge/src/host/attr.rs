//! Typed host attribute values

use crate::foundation::math::Color3;

/// A typed attribute value as stored on a host node
///
/// Getters on the host trait take a default so callers never have to care
/// whether an attribute is present; type mismatches also fall back to the
/// default rather than failing.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean attribute
    Bool(bool),
    /// Integer attribute
    Int(i32),
    /// Float attribute
    Float(f32),
    /// Enum attribute, stored by index
    Enum(i32),
    /// RGB color attribute
    Color(Color3),
    /// String attribute
    Str(String),
}

impl AttrValue {
    /// Boolean view of the value, if it has one
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; enums expose their index here as well
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) | Self::Enum(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view; integers widen losslessly
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Color view of the value, if it has one
    #[must_use]
    pub fn as_color(&self) -> Option<Color3> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_reads_as_int() {
        assert_eq!(AttrValue::Enum(2).as_int(), Some(2));
        assert_eq!(AttrValue::Bool(true).as_int(), None);
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(AttrValue::Int(3).as_float(), Some(3.0));
    }
}

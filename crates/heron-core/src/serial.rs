//! Type-directed coercion of raw request data.
//!
//! A [`Serial`] turns a [`Raw`] value (one string, a multi-valued list, or a
//! whole JSON body) into any `DeserializeOwned` type. [`TextSerial`] is the
//! default implementation.
//!
//! # Example
//!
//! ```
//! use heron_core::{Raw, Serial, TextSerial};
//!
//! let serial = TextSerial;
//!
//! let n: u32 = serial.deserialize(Raw::Text("42")).unwrap();
//! assert_eq!(n, 42);
//!
//! let tags: Vec<String> = serial.deserialize(Raw::Text("a,b,c")).unwrap();
//! assert_eq!(tags, ["a", "b", "c"]);
//!
//! let on: bool = serial.deserialize(Raw::Text("T")).unwrap();
//! assert!(on);
//! ```

use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, SeqAccess, Visitor};
use serde::Deserializer;
use std::any::type_name;
use thiserror::Error;

/// Raw request data awaiting coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Raw<'a> {
    /// A single text value: a path parameter, header, cookie or default.
    Text(&'a str),
    /// Every value recorded under one query or form key, in request order.
    Values(&'a [String]),
    /// A whole JSON request body.
    Json(&'a [u8]),
}

/// Error produced by a [`Serial`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerialError {
    message: String,
}

impl SerialError {
    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn invalid(value: &str, ty: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            message: format!("invalid value {value:?} for {ty}: {reason}"),
        }
    }
}

impl de::Error for SerialError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
        }
    }
}

impl From<serde_json::Error> for SerialError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// The serializer capability: coerces raw request data into typed values.
///
/// Implementations are shared by every request of a dispatcher and must be
/// thread-safe.
pub trait Serial: Send + Sync + 'static {
    /// Coerces `raw` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`SerialError`] when the data does not fit the target type.
    fn deserialize<T: DeserializeOwned>(&self, raw: Raw<'_>) -> Result<T, SerialError>;
}

/// The default serializer.
///
/// Whole bodies are parsed as JSON. Text is read the way the target type
/// asks for it:
///
/// - scalars parse the first value (`bool` accepts `1 t T TRUE true True`
///   and `0 f F FALSE false False`)
/// - sequences take one element per value of multi-valued input, and split
///   single text (defaults, path segments, headers) on commas
/// - maps and structs parse the first value as JSON
/// - enums match unit variants by name
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerial;

impl Serial for TextSerial {
    fn deserialize<T: DeserializeOwned>(&self, raw: Raw<'_>) -> Result<T, SerialError> {
        match raw {
            Raw::Json(bytes) => Ok(serde_json::from_slice(bytes)?),
            Raw::Text(text) => T::deserialize(TextDeserializer {
                input: Input::One(text),
            }),
            Raw::Values(values) => T::deserialize(TextDeserializer {
                input: Input::Many(values),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Input<'a> {
    One(&'a str),
    Many(&'a [String]),
}

impl<'a> Input<'a> {
    fn first(self) -> Result<&'a str, SerialError> {
        match self {
            Self::One(text) => Ok(text),
            Self::Many(values) => values
                .first()
                .map(String::as_str)
                .ok_or_else(|| de::Error::custom("no value present")),
        }
    }

    fn items(self) -> Vec<&'a str> {
        match self {
            Self::One("") => Vec::new(),
            Self::One(text) => text.split(',').collect(),
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

struct TextDeserializer<'a> {
    input: Input<'a>,
}

impl<'a> TextDeserializer<'a> {
    fn one(text: &'a str) -> Self {
        Self {
            input: Input::One(text),
        }
    }
}

fn parse_bool(text: &str) -> Result<bool, SerialError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(SerialError::invalid(text, "bool", "not a boolean")),
    }
}

macro_rules! parse_scalar {
    ($trait_fn:ident, $visit_fn:ident, $ty:ty) => {
        fn $trait_fn<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<'de>,
        {
            let text = self.input.first()?;
            let value = text
                .parse::<$ty>()
                .map_err(|e| SerialError::invalid(text, stringify!($ty), e))?;
            visitor.$visit_fn(value)
        }
    };
}

impl<'de, 'a> Deserializer<'de> for TextDeserializer<'a> {
    type Error = SerialError;

    parse_scalar!(deserialize_i8, visit_i8, i8);
    parse_scalar!(deserialize_i16, visit_i16, i16);
    parse_scalar!(deserialize_i32, visit_i32, i32);
    parse_scalar!(deserialize_i64, visit_i64, i64);
    parse_scalar!(deserialize_i128, visit_i128, i128);
    parse_scalar!(deserialize_u8, visit_u8, u8);
    parse_scalar!(deserialize_u16, visit_u16, u16);
    parse_scalar!(deserialize_u32, visit_u32, u32);
    parse_scalar!(deserialize_u64, visit_u64, u64);
    parse_scalar!(deserialize_u128, visit_u128, u128);
    parse_scalar!(deserialize_f32, visit_f32, f32);
    parse_scalar!(deserialize_f64, visit_f64, f64);
    parse_scalar!(deserialize_char, visit_char, char);

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Input::Many(values) if values.len() > 1 => self.deserialize_seq(visitor),
            _ => self.deserialize_str(visitor),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(parse_bool(self.input.first()?)?)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_str(self.input.first()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bytes(self.input.first()?.as_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(Items {
            items: self.input.items().into_iter(),
        })
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let value: serde_json::Value = serde_json::from_str(self.input.first()?)?;
        Ok(value.deserialize_map(visitor)?)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let value: serde_json::Value = serde_json::from_str(self.input.first()?)?;
        Ok(value.deserialize_struct(name, fields, visitor)?)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let text = self.input.first()?;
        IntoDeserializer::<SerialError>::into_deserializer(text)
            .deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct Items<'a> {
    items: std::vec::IntoIter<&'a str>,
}

impl<'de, 'a> SeqAccess<'de> for Items<'a> {
    type Error = SerialError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        self.items
            .next()
            .map(|item| seed.deserialize(TextDeserializer::one(item)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Returns a short name for `T`, for log and error messages.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

//! Typed argument values and their wire encoding.
//!
//! Every argument a command accepts carries a value of one of the closed set
//! of data types in [`ArgumentDataType`]. Parsed values are represented as
//! [`ArgumentValue`] and travel inside invocation documents with an explicit
//! `type` tag so receivers can validate the payload shape against the tag.
//!
//! # Wire Format
//!
//! Values encode as adjacently tagged JSON:
//!
//! ```text
//! { "type": "int",  "value": 8 }
//! { "type": "date", "value": "2026-05-01T09:30:00Z" }
//! { "type": "file", "value": { "name": "banana.txt", "data": "<base64>" } }
//! ```
//!
//! A `type` tag that does not match the payload shape fails deserialization.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of value types an argument can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgumentDataType {
    /// Textual `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
    /// ISO-8601 timestamp.
    Date,
    /// A filename paired with an opaque byte blob.
    File,
}

impl fmt::Display for ArgumentDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Date => "date",
            Self::File => "file",
        };
        write!(f, "{name}")
    }
}

/// A parsed, typed argument value.
///
/// The `file` variant carries both the basename of the source file and its
/// contents; the bytes are read eagerly when the command line is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ArgumentValue {
    /// Boolean value (flags are always `true` when present).
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Double(f64),
    /// String value.
    String(String),
    /// Timestamp value, ISO-8601 on the wire.
    Date(DateTime<Utc>),
    /// File value: basename plus contents.
    File {
        /// Basename of the file the bytes were read from.
        name: String,
        /// Raw file contents, base64 on the wire.
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

impl ArgumentValue {
    /// Returns the data type this value carries.
    #[must_use]
    pub const fn data_type(&self) -> ArgumentDataType {
        match self {
            Self::Bool(_) => ArgumentDataType::Bool,
            Self::Int(_) => ArgumentDataType::Int,
            Self::Double(_) => ArgumentDataType::Double,
            Self::String(_) => ArgumentDataType::String,
            Self::Date(_) => ArgumentDataType::Date,
            Self::File { .. } => ArgumentDataType::File,
        }
    }

    /// Converts raw command-line text into a value of the requested type.
    ///
    /// Conversions follow the parser contract: `bool` accepts the literal
    /// strings `true` and `false`, `int` and `double` use native numeric
    /// parses, `date` accepts ISO-8601 / RFC 3339, and `file` reads the path
    /// into memory using its basename as the file name.
    ///
    /// # Errors
    ///
    /// Returns [`ValueConversionError`] preserving the original text when the
    /// conversion fails.
    pub fn from_text(data_type: ArgumentDataType, text: &str) -> Result<Self, ValueConversionError> {
        let not_convertible = || ValueConversionError {
            value: text.to_string(),
            data_type,
        };

        match data_type {
            ArgumentDataType::Bool => match text {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(not_convertible()),
            },
            ArgumentDataType::Int => text
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|_| not_convertible()),
            ArgumentDataType::Double => text
                .parse::<f64>()
                .map(Self::Double)
                .map_err(|_| not_convertible()),
            ArgumentDataType::String => Ok(Self::String(text.to_string())),
            ArgumentDataType::Date => DateTime::parse_from_rfc3339(text)
                .map(|dt| Self::Date(dt.with_timezone(&Utc)))
                .map_err(|_| not_convertible()),
            ArgumentDataType::File => {
                let path = Path::new(text);
                let data = std::fs::read(path).map_err(|_| not_convertible())?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(not_convertible)?;
                Ok(Self::File { name, data })
            },
        }
    }
}

/// A value that could not be converted to its argument's data type.
///
/// Carries the original text so diagnostics can echo exactly what the user
/// typed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value {value:?} is not convertible to type {data_type}")]
pub struct ValueConversionError {
    /// The text that failed to convert.
    pub value: String,
    /// The type the conversion targeted.
    pub data_type: ArgumentDataType,
}

/// Serde adapter encoding byte blobs as base64 strings.
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn bool_conversion_accepts_literals_only() {
        assert_eq!(
            ArgumentValue::from_text(ArgumentDataType::Bool, "true").unwrap(),
            ArgumentValue::Bool(true)
        );
        assert_eq!(
            ArgumentValue::from_text(ArgumentDataType::Bool, "false").unwrap(),
            ArgumentValue::Bool(false)
        );

        let err = ArgumentValue::from_text(ArgumentDataType::Bool, "yes").unwrap_err();
        assert_eq!(err.value, "yes");
        assert_eq!(err.data_type, ArgumentDataType::Bool);
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(
            ArgumentValue::from_text(ArgumentDataType::Int, "8").unwrap(),
            ArgumentValue::Int(8)
        );
        assert_eq!(
            ArgumentValue::from_text(ArgumentDataType::Double, "2.5").unwrap(),
            ArgumentValue::Double(2.5)
        );
        assert!(ArgumentValue::from_text(ArgumentDataType::Int, "xyz").is_err());
        assert!(ArgumentValue::from_text(ArgumentDataType::Double, "1..2").is_err());
    }

    #[test]
    fn conversion_error_preserves_original_text() {
        let err = ArgumentValue::from_text(ArgumentDataType::Int, "not-a-number").unwrap_err();
        assert_eq!(err.value, "not-a-number");
        assert!(err.to_string().contains("not-a-number"));
    }

    #[test]
    fn date_conversion_is_iso8601() {
        let value = ArgumentValue::from_text(ArgumentDataType::Date, "2026-05-01T09:30:00Z")
            .expect("valid timestamp");
        let ArgumentValue::Date(dt) = value else {
            panic!("expected date value");
        };
        assert_eq!(dt.timestamp(), 1_777_627_800);

        assert!(ArgumentValue::from_text(ArgumentDataType::Date, "May 1st").is_err());
    }

    #[test]
    fn file_conversion_reads_bytes_and_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banana.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"peel me").unwrap();

        let value =
            ArgumentValue::from_text(ArgumentDataType::File, path.to_str().unwrap()).unwrap();
        let ArgumentValue::File { name, data } = value else {
            panic!("expected file value");
        };
        assert_eq!(name, "banana.txt");
        assert_eq!(data, b"peel me");
    }

    #[test]
    fn file_conversion_missing_path_fails() {
        let err =
            ArgumentValue::from_text(ArgumentDataType::File, "/nonexistent/banana.txt").unwrap_err();
        assert_eq!(err.data_type, ArgumentDataType::File);
    }

    #[test]
    fn value_encoding_is_type_tagged() {
        let json = serde_json::to_value(ArgumentValue::Int(8)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "int", "value": 8 }));

        let json = serde_json::to_value(ArgumentValue::File {
            name: "a.bin".to_string(),
            data: vec![1, 2, 3],
        })
        .unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["value"]["name"], "a.bin");
        assert_eq!(json["value"]["data"], "AQID");
    }

    #[test]
    fn value_decoding_rejects_mismatched_shape() {
        let result = serde_json::from_str::<ArgumentValue>(r#"{ "type": "int", "value": "8" }"#);
        assert!(result.is_err(), "int tag with string payload must fail");
    }

    #[test]
    fn value_round_trip() {
        let values = vec![
            ArgumentValue::Bool(true),
            ArgumentValue::Int(-42),
            ArgumentValue::Double(1.5),
            ArgumentValue::String("hello world".to_string()),
            ArgumentValue::File {
                name: "blob".to_string(),
                data: vec![0, 255, 128],
            },
        ];
        for value in values {
            let encoded = serde_json::to_vec(&value).unwrap();
            let decoded: ArgumentValue = serde_json::from_slice(&encoded).unwrap();
            assert_eq!(decoded, value);
        }
    }
}

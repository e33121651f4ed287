//! Coercion of decoded responses into the caller's result type.
//!
//! # Design
//! The result type is chosen statically through [`FromResponse`]. Each
//! implementation declares a [`ResponseKind`], which the pipeline reads
//! once per call (it decides whether non-JSON bodies stay as bytes), and
//! checks the decoded shape at runtime.
//!
//! Structured models opt in by implementing [`Model`]; they are built
//! from the decoded JSON with `serde` and then run their own
//! [`Model::validate`] hook.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::decode::Decoded;
use crate::error::Error;

/// How a result type wants the response handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// No content expected.
    Empty,
    /// Structured model built from JSON.
    Model,
    /// Raw byte sequence.
    Bytes,
    /// Any other type, checked against the decoded shape.
    Other,
}

/// A type a response can be coerced into.
pub trait FromResponse: Sized {
    const KIND: ResponseKind;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error>;
}

/// A structured model, validated on construction from a response.
///
/// ```rust,ignore
/// #[derive(serde::Deserialize)]
/// struct Pet { name: String }
///
/// impl http_noah::Model for Pet {
///     fn validate(&self) -> Result<(), String> {
///         if self.name.is_empty() { Err("empty name".into()) } else { Ok(()) }
///     }
/// }
/// ```
pub trait Model: DeserializeOwned {
    /// Checks that serde cannot express. Runs after deserialization.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

fn mismatch<T>(expected: &'static str, decoded: &Decoded) -> Result<T, Error> {
    tracing::error!(expected, found = decoded.kind(), data = ?decoded, "Type mismatch");
    Err(Error::TypeMismatch {
        expected,
        found: decoded.kind(),
    })
}

impl<M: Model> FromResponse for M {
    const KIND: ResponseKind = ResponseKind::Model;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        let model = std::any::type_name::<M>();
        let raw = match decoded {
            Decoded::Json(value) => value,
            Decoded::Text(text) => Value::String(text),
            other => return mismatch(model, &other),
        };
        let parsed = serde_json::from_value::<M>(raw.clone()).and_then(|m| {
            m.validate().map(|()| m).map_err(serde::de::Error::custom)
        });
        parsed.map_err(|e| {
            tracing::error!(data = %raw, error = %e, "Failed to parse {model}");
            Error::Validation {
                model,
                reason: e.to_string(),
                raw,
            }
        })
    }
}

impl FromResponse for () {
    const KIND: ResponseKind = ResponseKind::Empty;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Empty => Ok(()),
            other => mismatch("no content", &other),
        }
    }
}

impl<T: FromResponse> FromResponse for Option<T> {
    const KIND: ResponseKind = T::KIND;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Empty => Ok(None),
            other => T::from_decoded(other).map(Some),
        }
    }
}

impl FromResponse for Bytes {
    const KIND: ResponseKind = ResponseKind::Bytes;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Bytes(data) => Ok(data),
            other => mismatch("bytes", &other),
        }
    }
}

impl FromResponse for Vec<u8> {
    const KIND: ResponseKind = ResponseKind::Bytes;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        Bytes::from_decoded(decoded).map(Vec::from)
    }
}

impl FromResponse for String {
    const KIND: ResponseKind = ResponseKind::Other;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Text(text) | Decoded::Json(Value::String(text)) => Ok(text),
            other => mismatch("string", &other),
        }
    }
}

impl FromResponse for Value {
    const KIND: ResponseKind = ResponseKind::Other;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Json(value) => Ok(value),
            other => mismatch("JSON value", &other),
        }
    }
}

impl FromResponse for Vec<Value> {
    const KIND: ResponseKind = ResponseKind::Other;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Json(Value::Array(items)) => Ok(items),
            other => mismatch("JSON array", &other),
        }
    }
}

impl FromResponse for Map<String, Value> {
    const KIND: ResponseKind = ResponseKind::Other;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Json(Value::Object(map)) => Ok(map),
            other => mismatch("JSON object", &other),
        }
    }
}

impl FromResponse for bool {
    const KIND: ResponseKind = ResponseKind::Other;

    fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
        match decoded {
            Decoded::Json(Value::Bool(flag)) => Ok(flag),
            other => mismatch("boolean", &other),
        }
    }
}

macro_rules! number_from_response {
    ($ty:ty, $as:ident, $name:literal) => {
        impl FromResponse for $ty {
            const KIND: ResponseKind = ResponseKind::Other;

            fn from_decoded(decoded: Decoded) -> Result<Self, Error> {
                match &decoded {
                    Decoded::Json(value) => match value.$as() {
                        Some(n) => Ok(n),
                        None => mismatch($name, &decoded),
                    },
                    _ => mismatch($name, &decoded),
                }
            }
        }
    };
}

number_from_response!(i64, as_i64, "integer");
number_from_response!(u64, as_u64, "unsigned integer");
number_from_response!(f64, as_f64, "number");

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
    }

    impl Model for Pet {
        fn validate(&self) -> Result<(), String> {
            if self.name.is_empty() {
                return Err("name must not be empty".to_string());
            }
            Ok(())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(transparent)]
    struct Pets(Vec<Pet>);

    impl Model for Pets {}

    #[test]
    fn kinds_are_declared_per_type() {
        assert_eq!(<() as FromResponse>::KIND, ResponseKind::Empty);
        assert_eq!(<Pet as FromResponse>::KIND, ResponseKind::Model);
        assert_eq!(<Bytes as FromResponse>::KIND, ResponseKind::Bytes);
        assert_eq!(<Option<Vec<u8>> as FromResponse>::KIND, ResponseKind::Bytes);
        assert_eq!(<String as FromResponse>::KIND, ResponseKind::Other);
    }

    #[test]
    fn unit_accepts_only_no_content() {
        assert!(<()>::from_decoded(Decoded::Empty).is_ok());
        let err = <()>::from_decoded(Decoded::Json(json!({"name": "foo"}))).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "no content",
                found: "JSON object"
            }
        ));
    }

    #[test]
    fn value_types_reject_no_content() {
        let err = Pet::from_decoded(Decoded::Empty).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { found: "no content", .. }));
        let err = String::from_decoded(Decoded::Empty).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn option_maps_no_content_to_none() {
        assert_eq!(Option::<Pet>::from_decoded(Decoded::Empty).unwrap(), None);
        assert_eq!(
            Option::<Pet>::from_decoded(Decoded::Json(json!({"name": "foo"}))).unwrap(),
            Some(Pet {
                name: "foo".to_string()
            })
        );
    }

    #[test]
    fn model_from_object_and_list_root() {
        let pet = Pet::from_decoded(Decoded::Json(json!({"name": "foo"}))).unwrap();
        assert_eq!(pet.name, "foo");
        let pets = Pets::from_decoded(Decoded::Json(json!([{"name": "foo"}, {"name": "bar"}]))).unwrap();
        assert_eq!(pets.0.len(), 2);
    }

    #[test]
    fn model_validation_failure_keeps_raw_value() {
        let err = Pet::from_decoded(Decoded::Json(json!({"legs": 4}))).unwrap_err();
        let Error::Validation { raw, reason, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(raw, json!({"legs": 4}));
        assert!(reason.contains("name"), "{reason}");
    }

    #[test]
    fn model_validate_hook_runs() {
        let err = Pet::from_decoded(Decoded::Json(json!({"name": ""}))).unwrap_err();
        let Error::Validation { reason, .. } = err else {
            panic!("expected validation error");
        };
        assert!(reason.contains("must not be empty"), "{reason}");
    }

    #[test]
    fn model_from_text_is_a_validation_error() {
        let err = Pet::from_decoded(Decoded::Text("boo".to_string())).unwrap_err();
        assert!(matches!(err, Error::Validation { raw: Value::String(_), .. }));
    }

    #[test]
    fn string_from_text_or_json_string() {
        assert_eq!(String::from_decoded(Decoded::Text("boo".into())).unwrap(), "boo");
        assert_eq!(String::from_decoded(Decoded::Json(json!("boo"))).unwrap(), "boo");
        assert!(String::from_decoded(Decoded::Json(json!(1))).is_err());
    }

    #[test]
    fn integer_requires_json_number() {
        assert_eq!(i64::from_decoded(Decoded::Json(json!(1))).unwrap(), 1);
        let err = i64::from_decoded(Decoded::Text("1".into())).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "integer",
                found: "text"
            }
        ));
        assert!(u64::from_decoded(Decoded::Json(json!(-1))).is_err());
        assert_eq!(f64::from_decoded(Decoded::Json(json!(1.5))).unwrap(), 1.5);
    }

    #[test]
    fn collections_check_json_shape() {
        assert_eq!(Vec::<Value>::from_decoded(Decoded::Json(json!([1]))).unwrap(), vec![json!(1)]);
        assert!(Vec::<Value>::from_decoded(Decoded::Json(json!({}))).is_err());
        let map = Map::<String, Value>::from_decoded(Decoded::Json(json!({"name": "foo"}))).unwrap();
        assert_eq!(map["name"], "foo");
        assert!(bool::from_decoded(Decoded::Json(json!(true))).unwrap());
    }

    #[test]
    fn bytes_reject_parsed_json() {
        assert_eq!(
            Vec::<u8>::from_decoded(Decoded::Bytes(Bytes::from_static(b"bin"))).unwrap(),
            b"bin".to_vec()
        );
        let err = Bytes::from_decoded(Decoded::Json(json!("bin"))).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: "bytes", .. }));
    }
}

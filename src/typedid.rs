use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use mongodb::bson::Bson;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Gives each stored document kind a short prefix so ids of different kinds
/// cannot be mixed up, e.g. `RWC-5f0c...` for a reward campaign.
pub trait TypedIdMarker {
    fn tag() -> &'static str;
}

pub struct TypedId<T: TypedIdMarker> {
    uuid: Uuid,
    marker: PhantomData<fn() -> T>,
}

impl<T: TypedIdMarker> TypedId<T> {
    pub fn new() -> TypedId<T> {
        TypedId {
            uuid: Uuid::new_v4(),
            marker: PhantomData,
        }
    }
}

impl<T: TypedIdMarker> Default for TypedId<T> {
    fn default() -> TypedId<T> {
        TypedId::new()
    }
}

impl<T: TypedIdMarker> Copy for TypedId<T> {}

impl<T: TypedIdMarker> Clone for TypedId<T> {
    fn clone(&self) -> TypedId<T> {
        *self
    }
}

impl<T: TypedIdMarker> PartialEq for TypedId<T> {
    fn eq(&self, other: &TypedId<T>) -> bool {
        self.uuid == other.uuid
    }
}

impl<T: TypedIdMarker> Eq for TypedId<T> {}

impl<T: TypedIdMarker> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state)
    }
}

impl<T: TypedIdMarker> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", T::tag(), self.uuid.hyphenated())
    }
}

impl<T: TypedIdMarker> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<T: TypedIdMarker> FromStr for TypedId<T> {
    type Err = TypedIdParseError;

    fn from_str(s: &str) -> Result<TypedId<T>, TypedIdParseError> {
        let (tag, uuid) = s.split_once('-').ok_or(TypedIdParseError::MissingTag)?;
        if tag != T::tag() {
            return Err(TypedIdParseError::WrongTag {
                expected: T::tag(),
            });
        }

        let uuid = Uuid::parse_str(uuid).map_err(|_| TypedIdParseError::InvalidUuid)?;

        Ok(TypedId {
            uuid,
            marker: PhantomData,
        })
    }
}

impl<T: TypedIdMarker> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: TypedIdMarker> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<TypedId<T>, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl<T: TypedIdMarker> From<TypedId<T>> for Bson {
    fn from(id: TypedId<T>) -> Bson {
        Bson::String(id.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypedIdParseError {
    MissingTag,
    WrongTag { expected: &'static str },
    InvalidUuid,
}

impl Display for TypedIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedIdParseError::MissingTag => write!(f, "id is missing its tag prefix"),
            TypedIdParseError::WrongTag { expected } => {
                write!(f, "id does not start with '{}-'", expected)
            }
            TypedIdParseError::InvalidUuid => write!(f, "id does not contain a valid uuid"),
        }
    }
}

impl std::error::Error for TypedIdParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl TypedIdMarker for Widget {
        fn tag() -> &'static str {
            "WGT"
        }
    }

    #[test]
    fn displayed_id_parses_back() {
        let id = TypedId::<Widget>::new();
        let parsed: TypedId<Widget> = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert!(id.to_string().starts_with("WGT-"));
    }

    #[test]
    fn uppercase_uuids_are_accepted() {
        let result = "WGT-16E77539-8873-4C8A-BCA3-2036010474AD".parse::<TypedId<Widget>>();

        assert!(result.is_ok());
    }

    #[test]
    fn parse_rejects_other_tags() {
        let result = "SPC-16E77539-8873-4C8A-BCA3-2036010474AD".parse::<TypedId<Widget>>();

        assert_eq!(
            result.unwrap_err(),
            TypedIdParseError::WrongTag { expected: "WGT" }
        );
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let result = "WGT16E77539".parse::<TypedId<Widget>>();

        assert_eq!(result.unwrap_err(), TypedIdParseError::MissingTag);
    }

    #[test]
    fn ids_serialize_as_tagged_strings() {
        let id = TypedId::<Widget>::new();

        let json = serde_json::to_value(id).unwrap();

        assert_eq!(json, serde_json::Value::String(id.to_string()));
        assert_eq!(Bson::from(id), Bson::String(id.to_string()));
    }
}

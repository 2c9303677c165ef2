use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub success: bool,
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> MessageBody {
        MessageBody {
            success: true,
            message: message.into(),
        }
    }
}

/// Returns the trimmed value or rejects it if nothing is left.
pub fn require_text(field: &'static str, value: String) -> Result<String, crate::error::Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::Error::InvalidField {
            field,
            reason: "must not be empty",
        });
    }

    Ok(trimmed.to_string())
}

/// Stores `Option<DateTime<Utc>>` as an optional bson datetime so it can be
/// compared server-side like the non-optional timestamps.
pub mod optional_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<bson::DateTime>::deserialize(deserializer)?;
        Ok(value.map(|datetime| datetime.to_chrono()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn require_text_trims() {
        assert_eq!(
            require_text("name", "  Corner Cafe ".into()).unwrap(),
            "Corner Cafe"
        );
    }

    #[test]
    fn require_text_rejects_blank() {
        assert_eq!(
            require_text("name", "   ".into()).unwrap_err(),
            Error::InvalidField {
                field: "name",
                reason: "must not be empty"
            }
        );
    }
}

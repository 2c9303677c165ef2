use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derivative::Derivative;
use mongodb::bson::ser::Error as BsonError;
use mongodb::error::Error as DatabaseError;
use reqwest::Error as UpstreamError;
use serde::{Serialize, Serializer};

use crate::campaign::CampaignId;
use crate::space::SpaceId;
use crate::user::UserId;

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq, Eq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidPath(#[derivative(PartialEq = "ignore")] PathError),
    #[serde(serialize_with = "display")]
    InvalidForm(#[derivative(PartialEq = "ignore")] UrlencodedError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    InvalidResetToken,
    InvalidPaymentSignature {
        order_id: String,
    },

    // 404
    PathNotFound,
    SpaceNotFound {
        space_id: SpaceId,
    },
    CampaignNotFound {
        campaign_id: CampaignId,
    },
    NoActiveCampaign {
        code: String,
    },
    UserNotFound {
        user_id: UserId,
    },
    SubscriptionNotFound {
        order_id: String,
    },

    // 409
    ConcurrentModificationDetected,
    CampaignCodeAlreadyExists {
        code: String,
    },
    EmailAlreadyRegistered {
        email: String,
    },
    RewardsExhausted {
        campaign_id: CampaignId,
    },
    ResetTokenAlreadyUsed,
    SubscriptionAlreadyActive {
        order_id: String,
    },

    // 410
    ResetTokenExpired,

    // 502
    #[serde(serialize_with = "display")]
    FailedUpstreamCall(#[derivative(PartialEq = "ignore")] UpstreamError),
    UpstreamRejected {
        service: &'static str,
        status: u16,
    },

    // 503
    ServiceNotConfigured {
        service: &'static str,
    },

    // 500
    ExistentialState(String),
    InvalidConfig {
        key: &'static str,
        value: String,
    },
    CryptoFailure,
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    #[serde(serialize_with = "display")]
    FailedToSerializeToBson(#[derivative(PartialEq = "ignore")] BsonError),
    #[serde(serialize_with = "display")]
    IoError(#[derivative(PartialEq = "ignore")] IoError),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidPath(_) => "E4001001",
            Error::InvalidForm(_) => "E4001002",
            Error::InvalidQuery(_) => "E4001003",
            Error::InvalidField { .. } => "E4001004",
            Error::InvalidResetToken => "E4001005",
            Error::InvalidPaymentSignature { .. } => "E4001006",
            Error::PathNotFound => "E4041000",
            Error::SpaceNotFound { .. } => "E4041001",
            Error::CampaignNotFound { .. } => "E4041002",
            Error::NoActiveCampaign { .. } => "E4041003",
            Error::UserNotFound { .. } => "E4041004",
            Error::SubscriptionNotFound { .. } => "E4041005",
            Error::ConcurrentModificationDetected => "E4091000",
            Error::CampaignCodeAlreadyExists { .. } => "E4091001",
            Error::EmailAlreadyRegistered { .. } => "E4091002",
            Error::RewardsExhausted { .. } => "E4091003",
            Error::ResetTokenAlreadyUsed => "E4091004",
            Error::SubscriptionAlreadyActive { .. } => "E4091005",
            Error::ResetTokenExpired => "E4101000",
            Error::FailedUpstreamCall(_) => "E5021000",
            Error::UpstreamRejected { .. } => "E5021001",
            Error::ServiceNotConfigured { .. } => "E5031000",
            Error::ExistentialState(_) => "E5001000",
            Error::InvalidConfig { .. } => "E5001001",
            Error::CryptoFailure => "E5001002",
            Error::FailedDatabaseCall(_) => "E5001003",
            Error::FailedToSerializeToBson(_) => "E5001004",
            Error::IoError(_) => "E5001005",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidPath(_) => "The given path could not be parsed",
            Error::InvalidForm(_) => "The given form could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::InvalidField { .. } => "A field in the request failed validation",
            Error::InvalidResetToken => "The password reset token is invalid",
            Error::InvalidPaymentSignature { .. } => "The payment signature could not be verified",
            Error::PathNotFound => "The requested path was not found",
            Error::SpaceNotFound { .. } => "The requested space was not found",
            Error::CampaignNotFound { .. } => "The requested campaign was not found",
            Error::NoActiveCampaign { .. } => "No active campaign found for this QR code",
            Error::UserNotFound { .. } => "The requested user was not found",
            Error::SubscriptionNotFound { .. } => "No subscription exists for the given order",
            Error::ConcurrentModificationDetected => {
                "The server detected a concurrent modification"
            }
            Error::CampaignCodeAlreadyExists { .. } => {
                "Another campaign already uses the generated code"
            }
            Error::EmailAlreadyRegistered { .. } => "An account with this email already exists",
            Error::RewardsExhausted { .. } => "All rewards for this campaign have been redeemed",
            Error::ResetTokenAlreadyUsed => "The password reset token has already been used",
            Error::SubscriptionAlreadyActive { .. } => {
                "The subscription for this order is already active"
            }
            Error::ResetTokenExpired => "The password reset token has expired",
            Error::FailedUpstreamCall(_) => {
                "An error occurred when communicating with an external service"
            }
            Error::UpstreamRejected { .. } => "An external service rejected the request",
            Error::ServiceNotConfigured { .. } => "The requested service is not configured",
            Error::ExistentialState(_) => "The server detected an invalid state",
            Error::InvalidConfig { .. } => "The server configuration is invalid",
            Error::CryptoFailure => "A cryptographic operation failed",
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedToSerializeToBson(_) => {
                "An error occurred when serializing an object to bson"
            }
            Error::IoError(_) => "An error occurred during an I/O operation",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Error::InvalidForm(_) => StatusCode::BAD_REQUEST,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::InvalidField { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidResetToken => StatusCode::BAD_REQUEST,
            Error::InvalidPaymentSignature { .. } => StatusCode::BAD_REQUEST,
            Error::PathNotFound => StatusCode::NOT_FOUND,
            Error::SpaceNotFound { .. } => StatusCode::NOT_FOUND,
            Error::CampaignNotFound { .. } => StatusCode::NOT_FOUND,
            Error::NoActiveCampaign { .. } => StatusCode::NOT_FOUND,
            Error::UserNotFound { .. } => StatusCode::NOT_FOUND,
            Error::SubscriptionNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ConcurrentModificationDetected => StatusCode::CONFLICT,
            Error::CampaignCodeAlreadyExists { .. } => StatusCode::CONFLICT,
            Error::EmailAlreadyRegistered { .. } => StatusCode::CONFLICT,
            Error::RewardsExhausted { .. } => StatusCode::CONFLICT,
            Error::ResetTokenAlreadyUsed => StatusCode::CONFLICT,
            Error::SubscriptionAlreadyActive { .. } => StatusCode::CONFLICT,
            Error::ResetTokenExpired => StatusCode::GONE,
            Error::FailedUpstreamCall(_) => StatusCode::BAD_GATEWAY,
            Error::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            Error::ServiceNotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::ExistentialState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::CryptoFailure => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedDatabaseCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedToSerializeToBson(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            success: bool,
            error: &'static str,
            error_code: &'static str,
            error_meta: &'a Error,
        }

        HttpResponse::build(self.status_code()).json(&Dummy {
            success: false,
            error: self.error_message(),
            error_code: self.error_code(),
            error_meta: self,
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<BsonError> for Error {
    fn from(error: BsonError) -> Error {
        Error::FailedToSerializeToBson(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl From<UpstreamError> for Error {
    fn from(error: UpstreamError) -> Error {
        Error::FailedUpstreamCall(error)
    }
}

impl From<ring::error::Unspecified> for Error {
    fn from(_: ring::error::Unspecified) -> Error {
        Error::CryptoFailure
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidPath(err) => Some(err),
            Error::InvalidForm(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::FailedUpstreamCall(err) => Some(err),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToBson(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_uses_uniform_shape() {
        let error = Error::NoActiveCampaign {
            code: "BMS-1-missing".into(),
        };

        let response = error.error_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.error_code(), "E4041003");
    }

    #[test]
    fn error_meta_serializes_variant_fields() {
        let error = Error::InvalidField {
            field: "email",
            reason: "must contain '@'",
        };

        let meta = serde_json::to_value(&error).unwrap();

        assert_eq!(
            meta,
            serde_json::json!({ "field": "email", "reason": "must contain '@'" })
        );
    }
}

use crate::error::ApiError;
use validator::Validate;

/// Run derive-generated field checks and fold every violation into one
/// client-facing validation error.
pub fn validate<T: Validate>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|err| ApiError::Validation(format!("invalid request body: {err}")))
}

use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path id, rejecting anything that is not a UUID
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("'{}' is not a valid media id", id)))
}

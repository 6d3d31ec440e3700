use uuid::Uuid;

use crate::errors::AppError;

/// Parses a listing or admin id received as text
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("Invalid id: {}", id)))
}

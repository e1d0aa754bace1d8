use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path id, rejecting anything that is not a UUID.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_invalid() {
        assert!(matches!(valid_uuid("not-a-uuid"), Err(AppError::InvalidId)));
        assert!(valid_uuid("5f0c6a4e-3d1b-4a62-9a55-0c1f2b3e4d5a").is_ok());
    }
}

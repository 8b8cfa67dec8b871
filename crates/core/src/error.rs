//! Domain error type shared by every layer above `core`.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity does not exist, is soft-deleted, or is not visible to the caller.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A required field is missing or a value is outside its domain.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Duplicate membership, duplicate friend request, caller already owns the entity.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not the owner / not a member.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a [`CoreError::Validation`] naming every missing field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        CoreError::Validation(format!("Missing required fields: {}", fields.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = CoreError::missing_fields(&["name", "target_date"]);
        assert_eq!(
            err.to_string(),
            "Validation failed: Missing required fields: name, target_date"
        );
    }

    #[test]
    fn not_found_display_names_entity() {
        let err = CoreError::NotFound {
            entity: "Event",
            id: 7,
        };
        assert_eq!(err.to_string(), "Entity not found: Event with id 7");
    }
}

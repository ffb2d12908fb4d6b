//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database and media storage operations.

mod content;
mod playlist;
mod relation;
mod user;
mod video;

pub use content::ContentService;
pub use playlist::PlaylistService;
pub use relation::RelationService;
pub use user::{RegisterUser, UserService};
pub use video::{PublishVideo, UpdateVideo, VideoService};

use crate::error::AppError;

/// Trimmed value, or None when absent or blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// `value` unchanged, unless it is missing or only whitespace.
///
/// For secrets, where surrounding spaces are significant.
pub(crate) fn not_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToOwned::to_owned)
}

/// Fail with `Forbidden` unless `actor_id` owns the entity.
pub(crate) fn ensure_owner(owner_id: &str, actor_id: &str, message: &str) -> Result<(), AppError> {
    if owner_id == actor_id {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn not_blank_keeps_surrounding_spaces() {
        assert_eq!(not_blank(Some(" pw ")), Some(" pw ".to_string()));
        assert_eq!(not_blank(Some(" \t ")), None);
        assert_eq!(not_blank(None), None);
    }

    #[test]
    fn ensure_owner_forbids_others() {
        assert!(ensure_owner("a", "a", "nope").is_ok());
        assert!(matches!(
            ensure_owner("a", "b", "nope"),
            Err(AppError::Forbidden(message)) if message == "nope"
        ));
    }
}

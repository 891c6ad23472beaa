//! File size policy applied before anything touches the network.

/// Largest file the inspection endpoint accepts, in bytes.
pub const MAX_FILE_SIZE: u64 = 30_000_000;

/// Message shown when a file exceeds the ceiling.
pub const OVERSIZE_MESSAGE: &str = "File size is too big";

/// Result of checking a candidate file against the ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The file may be transmitted.
    Accepted,
    /// The file must not be transmitted; carries the user-facing reason.
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Check a size against the ceiling (inclusive).
///
/// Callers pass the configured `limits.max_file_size`, which defaults to
/// [`MAX_FILE_SIZE`].
pub fn validate_with_ceiling(size: u64, ceiling: u64) -> ValidationOutcome {
    if size <= ceiling {
        ValidationOutcome::Accepted
    } else {
        ValidationOutcome::Rejected(OVERSIZE_MESSAGE.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(size: u64) -> ValidationOutcome {
        validate_with_ceiling(size, MAX_FILE_SIZE)
    }

    #[test]
    fn test_accepts_up_to_ceiling() {
        assert_eq!(validate(0), ValidationOutcome::Accepted);
        assert_eq!(validate(1_000), ValidationOutcome::Accepted);
        assert_eq!(validate(30_000_000), ValidationOutcome::Accepted);
    }

    #[test]
    fn test_rejects_above_ceiling_with_exact_message() {
        assert_eq!(
            validate(30_000_001),
            ValidationOutcome::Rejected("File size is too big".into())
        );
        assert_eq!(
            validate(u64::MAX),
            ValidationOutcome::Rejected("File size is too big".into())
        );
    }

    #[test]
    fn test_custom_ceiling() {
        assert!(validate_with_ceiling(10, 10).is_accepted());
        assert!(!validate_with_ceiling(11, 10).is_accepted());
    }
}

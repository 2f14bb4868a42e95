use thiserror::Error;

/// Rejections of malformed input to the pure engine functions
///
/// None of these leave a partially updated profile behind: every operation
/// validates before it touches its working copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlgoError {
    #[error("invalid attempt: {0}")]
    InvalidAttempt(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
    #[error("onboarding already completed")]
    AlreadyOnboarded,
}

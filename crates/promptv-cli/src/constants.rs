//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (config problems, unreadable input)
/// - 2: Misuse of shell command (reserved by clap for usage errors)
/// - 3+: One code per core error kind
pub mod exit_codes {
    /// Prompt, version or tag not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid name, reference or patch.
    pub const INVALID_INPUT: i32 = 4;

    /// Tag already exists.
    pub const ALREADY_EXISTS: i32 = 5;

    /// Storage backend failure.
    pub const STORAGE_FAILURE: i32 = 6;

    /// Inconsistent store state or lost commit race.
    pub const CONFLICT: i32 = 7;
}

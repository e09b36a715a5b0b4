//! Exit codes for the CLI tool.
//!
//! The interactive loop never exits on a patching error; these only cover
//! startup and interruption.

/// Normal exit from the menu
pub const SUCCESS: i32 = 0;
/// Ctrl+C twice (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Unusable configuration
pub const BAD_ARGS: i32 = 255;

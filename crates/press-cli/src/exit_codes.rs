//! Exit codes of the `press` binary.

use press_core::PressError;

pub const SUCCESS: i32 = 0;
pub const USER_ERROR: i32 = 1; // Bad arguments, config, unknown key, clearing disabled
pub const BUILD_ERROR: i32 = 2; // Source unreadable, minify failed, storage failed

pub fn for_error(error: &PressError) -> i32 {
    match error {
        PressError::UnresolvedKey { .. }
        | PressError::Config { .. }
        | PressError::PermissionDenied { .. } => USER_ERROR,
        PressError::Build { .. } | PressError::Storage { .. } => BUILD_ERROR,
    }
}

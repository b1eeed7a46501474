//! CLI Exit Code Registry
//!
//! Single source of truth for `ctrlboard` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success                                         |
//! | 1    | General error (unspecified)                     |
//! | 2    | Usage error (bad arguments)                     |
//! | 3    | Config file unreadable or invalid               |
//! | 4    | A table could not be fetched or parsed          |
//! | 5    | A table is not well-formed (schema error)       |
//! | 6    | Reconciliation found mismatching rows           |
//! | 7    | The selection has no plan data                  |

use ctrlboard_io::LoadError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file missing, unparsable, or failing validation.
pub const EXIT_CONFIG: u8 = 3;

/// Source unreachable, file unreadable, malformed CSV/JSON, missing sheet.
pub const EXIT_LOAD: u8 = 4;

/// Table loaded but ragged, with duplicate columns, or not tabular.
pub const EXIT_SCHEMA: u8 = 5;

/// At least one reconciliation row does not match.
pub const EXIT_MISMATCH: u8 = 6;

/// No plan record in scope for the selection.
pub const EXIT_NO_DATA: u8 = 7;

/// Map a load failure to its exit code.
pub fn load_exit_code(err: &LoadError) -> u8 {
    match err {
        LoadError::Schema { .. } => EXIT_SCHEMA,
        _ => EXIT_LOAD,
    }
}

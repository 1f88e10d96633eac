//! Process exit codes. Scripts and CI jobs depend on these values.

pub const SUCCESS: i32 = 0;
pub const CHECK_FAILED: i32 = 1; // Stale generated file or fixture violations
pub const CONFIG_ERROR: i32 = 2; // Bad config, unreadable input, unsupported construct in strict mode
pub const PARSE_ERROR: i32 = 3;

/// Minimum pixel count (h*w) to clip and combine lanes with Rayon.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default rejection threshold, in standard deviations, for frame combination.
pub const DEFAULT_COMBINE_THRESHOLD: f64 = 4.0;

/// Default iteration cap for frame combination.
pub const DEFAULT_COMBINE_MAX_ITERATIONS: u32 = 10;

/// Default rejection threshold for single-frame diagnostic statistics.
pub const DEFAULT_DIAGNOSTIC_THRESHOLD: f64 = 5.0;

/// Default iteration cap for single-frame diagnostic statistics.
pub const DEFAULT_DIAGNOSTIC_MAX_ITERATIONS: u32 = 10;

/// Number of leading characters of DATE-OBS compared during frame selection (YYYY-MM-DD).
pub const DATE_PREFIX_LEN: usize = 10;

/// Full-scale value of a 16-bit raster, used when converting output to u16.
pub const U16_FULL_SCALE: f64 = 65_535.0;

/// Exposure times closer than this (seconds) are considered equal during frame selection.
pub const EXPOSURE_TOLERANCE_S: f64 = 1e-6;

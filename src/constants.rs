// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role: how many blocks one call may carry, how tall a table may
//! be, how deep the renderer walks.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Document API boundaries
// ---------------------------------------------------------------------------

/// Most children one create-children call accepts.
pub const CREATE_CHILDREN_BATCH_SIZE: usize = 50;

/// How many blocks one page of a document listing returns.
///
/// 500 is the service maximum.
pub const DOCUMENT_LISTING_PAGE_SIZE: usize = 500;

/// Most rows a table may have at creation time, header included.
pub const TABLE_MAX_ROWS: usize = 9;

/// Per-call timeout of the HTTP client.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Response header carrying the seconds until the rate-limit quota resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ogw-ratelimit-reset";

// ---------------------------------------------------------------------------
// Formatting boundaries
// ---------------------------------------------------------------------------

/// Maximum nesting depth when recursively formatting or creating blocks.
///
/// Past this depth the renderer emits a placeholder instead of descending.
pub const BLOCK_MAX_RENDER_DEPTH: usize = 100;

/// Number of spaces per list nesting level in formatted output.
pub const INDENT_SPACES: usize = 2;

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 256;

// ---------------------------------------------------------------------------
// Table layout
// ---------------------------------------------------------------------------

/// Narrowest column the layout heuristic hands out, in pixels.
pub const TABLE_COLUMN_MIN_WIDTH: u32 = 80;

/// Widest column the layout heuristic hands out, in pixels.
pub const TABLE_COLUMN_MAX_WIDTH: u32 = 400;

/// Page width a table is spread across when its columns leave room.
pub const TABLE_TARGET_WIDTH: u32 = 720;

/// Pixels per display column of cell text.
pub const TABLE_PIXELS_PER_CHAR: u32 = 10;

// ---------------------------------------------------------------------------
// Import pacing and retry ceilings
// ---------------------------------------------------------------------------

/// Phase-1 call count above which a cooldown precedes phase 2.
pub const PHASE_TWO_COOLDOWN_THRESHOLD: usize = 20;

/// Pause inserted before phase 2 after a heavy phase 1.
pub const PHASE_TWO_COOLDOWN: Duration = Duration::from_secs(2);

/// Hard ceiling on attempts for one diagram import, rate limits included.
pub const DIAGRAM_MAX_TOTAL_ATTEMPTS: u32 = 10;

/// Rate-limit retries for each of the table cell-id fetch and fill calls.
pub const TABLE_RATE_LIMIT_RETRIES: u32 = 5;

/// Step of the linear backoff used between table-fill retries.
pub const TABLE_RETRY_STEP: Duration = Duration::from_millis(500);

/// Base of the exponential backoff, doubled per attempt.
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound of one exponential backoff sleep.
pub const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Upper bound of any single wait, server reset hints included.
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Markdown conventions
// ---------------------------------------------------------------------------

/// Link scheme for images that exist only as a remote media token.
pub const IMAGE_TOKEN_SCHEME: &str = "image-token://";

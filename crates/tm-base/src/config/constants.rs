// =============================================================================
// BACKEND
// =============================================================================

/// Query-answering service used when no override is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Path of the query endpoint, relative to the backend URL
pub const QUERY_PATH: &str = "/query";

/// Path of the deferred-result endpoint, relative to the backend URL
pub const CHECK_RESULT_PATH: &str = "/check_result";

/// Timeout for a single HTTP request (seconds). Short videos are answered inline,
/// so this has to cover a full transcript fetch + retrieval round trip.
pub const REQUEST_TIMEOUT_SECS: u64 = 90;

// =============================================================================
// RECONCILIATION
// =============================================================================

/// How often the poller sweeps the pending registry (seconds)
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Age after which a pending query is abandoned (seconds)
pub const PENDING_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Directory for storing histories and logs
pub const STORE_DIR: &str = "./.tubemate";

/// Per-content history files subdirectory
pub const HISTORY_DIR: &str = "history";

/// Log file subdirectory
pub const LOGS_DIR: &str = "logs";

/// Panic reports subdirectory
pub const ERRORS_DIR: &str = "errors";

/// Log file name inside LOGS_DIR
pub const LOG_FILE: &str = "tubemate.log";

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Poll interval for terminal events in milliseconds
pub const EVENT_POLL_MS: u64 = 50;

//! Constants for the Listonic API.

/// Base URL of the production Listonic API.
pub const API_BASE_URL: &str = "https://api.listonic.com";

/// Login and token-refresh endpoint.
pub const API_LOGIN_ENDPOINT: &str = "/api/loginextended";

/// Lists endpoint; item paths hang off `{list_id}/items`.
pub const API_LISTS_ENDPOINT: &str = "/api/lists";

/// Static OAuth2 application credentials. These identify the client
/// application, not the user, and are sent in the `clientauthorization`
/// header on login and refresh calls.
pub const CLIENT_ID: &str = "listonicv2";
pub const CLIENT_SECRET: &str = "fjdfsoj9874jdfhjkh34jkhffdfff";
pub const REDIRECT_URI: &str = "https://listonicv2api.jestemkucharzem.pl";

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Bounds applied to the configured poll interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Minimum spacing between rate-limited requests, in milliseconds.
pub const MIN_REQUEST_INTERVAL_MS: u64 = 100;

/// Total attempts for requests that hit 429 or 5xx responses.
pub const MAX_BACKOFF_ATTEMPTS: u32 = 3;

/// Exponential backoff parameters, in seconds.
pub const INITIAL_BACKOFF_SECS: u64 = 1;
pub const MAX_BACKOFF_SECS: u64 = 30;

/// Extra attempts allowed after a 401 once recovery succeeds
/// (original attempt + this many retries, a hard cap).
pub const MAX_AUTH_RETRIES: u32 = 1;

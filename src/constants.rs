/// Maximum bytes accepted for a proxied request body (1MB)
pub const MAX_PROXY_BODY_BYTES: usize = 1_000_000;

/// Maximum bytes accepted for registration and login bodies (8KB)
pub const MAX_AUTH_BODY_BYTES: usize = 8 * 1024;

/// Maximum bytes accepted for console package-version bodies (64KB)
pub const MAX_PACKAGE_VERSIONS_BODY_BYTES: usize = 64 * 1024;

/// Maximum bytes accepted for a contact form submission (32KB)
pub const MAX_CONTACT_BODY_BYTES: usize = 32 * 1024;

/// Default upstream request timeout in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Upper bound for the configurable upstream timeout
pub const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Rate Limiting
// =============================================================================

/// Sliding window shared by both auth flows
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Registration attempts allowed per key per window
pub const REGISTER_RATE_LIMIT_MAX_ATTEMPTS: i64 = 8;

/// Login attempts allowed per key per window
pub const LOGIN_RATE_LIMIT_MAX_ATTEMPTS: i64 = 10;

/// Lock and statement timeout applied inside the rate-limit transaction
pub const RATE_LIMIT_LOCK_TIMEOUT_MS: u64 = 2_000;

/// Longest single IP candidate we will try to parse out of a proxy header
pub const MAX_IP_HEADER_VALUE_CHARS: usize = 128;

/// Longest email accepted as rate-limit key material
pub const MAX_EMAIL_LENGTH_CHARS: usize = 320;

pub const DEFAULT_TRUST_PROXY_HOPS: usize = 1;
pub const MAX_TRUST_PROXY_HOPS: usize = 5;

// =============================================================================
// Credentials & Tokens
// =============================================================================

pub const MIN_PASSWORD_LENGTH_CHARS: usize = 10;
pub const MAX_PASSWORD_LENGTH_CHARS: usize = 512;

pub const MIN_CONTACT_NAME_CHARS: usize = 2;
pub const MAX_CONTACT_NAME_CHARS: usize = 200;
pub const MAX_CONTACT_COMPANY_CHARS: usize = 200;
pub const MIN_CONTACT_MESSAGE_CHARS: usize = 20;
pub const MAX_CONTACT_MESSAGE_CHARS: usize = 5000;

/// Minimum signing secret length for control API tokens
pub const MIN_API_AUTH_SECRET_BYTES: usize = 32;

/// Minimum HMAC key length for console session cookies
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

/// Control API token lifetime (5 minutes)
pub const CONTROL_API_TOKEN_TTL_SECS: i64 = 300;

pub const CONTROL_API_TOKEN_ISSUER: &str = "provenact-web";
pub const CONTROL_API_TOKEN_AUDIENCE: &str = "provenact-control";

pub const SESSION_COOKIE_NAME: &str = "provenact_session";

/// Default console session lifetime (12 hours)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 43_200;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_BODY_TOO_LARGE: &str = "Request body too large.";

pub const ERR_INVALID_JSON: &str = "Invalid JSON payload.";

pub const ERR_PATH_NOT_ALLOWED: &str = "Path is not allowed for this proxy route.";

pub const ERR_INVALID_EMAIL: &str = "A valid email is required.";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 10 characters.";

pub const ERR_CREDENTIALS_TOO_LONG: &str = "Email or password exceeds allowed length.";

pub const ERR_CREDENTIALS_REQUIRED: &str = "Email and password are required.";

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub const ERR_INVALID_PACKAGE_NAME: &str = "Invalid package name.";

pub const ERR_INVALID_JSON_BODY: &str = "Invalid JSON body";

pub const ERR_CONTACT_NAME: &str = "Please provide your name.";

pub const ERR_CONTACT_EMAIL: &str = "Please provide a valid email address.";

pub const ERR_CONTACT_MESSAGE_TOO_SHORT: &str =
    "Please provide a message with at least 20 characters.";

pub const ERR_CONTACT_FIELDS_TOO_LONG: &str = "One or more fields exceed allowed length.";

pub const ERR_CONTACT_MESSAGE_TOO_LONG: &str = "Message is too long.";

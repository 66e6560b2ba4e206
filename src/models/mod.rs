pub mod account;
pub mod contact;
pub mod rate_limit;

pub use account::{CredentialStore, Credentials};
pub use contact::ContactSubmission;
pub use rate_limit::{build_rate_limit_key, ProxyTrust, RateLimitScope};

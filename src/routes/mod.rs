pub mod contact;
pub mod health;
pub mod login;
pub mod packages;
pub mod proxy;
pub mod register;
pub mod validation;

pub use contact::submit_contact;
pub use health::health_check;
pub use login::login;
pub use packages::{list_package_versions, publish_package_version};
pub use proxy::{openapi_proxy, proxy_root};
pub use register::register_user;
pub use validation::{ensure_same_origin, ensure_strict_same_origin, is_valid_package_name};

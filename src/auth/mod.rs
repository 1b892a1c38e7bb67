//! Authentication Module
//! Mission: Vendor identity, bearer tokens and request authentication

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod revocation;
pub mod vendor_store;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::AuthenticatedVendor;
pub use password::PasswordHasher;
pub use vendor_store::VendorStore;

pub mod error;
pub mod extract;
pub mod orders;
pub mod products;
pub mod routes;

pub use error::ApiError;
pub use extract::JsonBody;
pub use routes::{create_router, AppState, RouterConfig};

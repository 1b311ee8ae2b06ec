pub mod cache;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod samples;
pub mod search;
pub mod tutorials;

pub use cache::CachedResponse;
pub use routes::create_router;

pub mod cache;
pub mod rate_limit;
pub mod request_id;

pub use cache::{CacheLayer, ResponseCacheMiddleware};
pub use rate_limit::{
    AuthRateLimiter, RateLimitConfig, RateLimitMiddleware, RateLimitStore, cleanup_rate_limits,
};
pub use request_id::{CorrelationId, RequestIdExt, RequestIdMiddleware};

//! Fixed-window request limits, per client address and per signed-in employee.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    web::Data,
};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::HashMap,
    fmt,
    net::IpAddr,
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

use crate::{
    config::Config,
    handlers::shared::ApiResponse,
    middleware::request_id::RequestIdExt,
    services::auth::{bearer_token, decode_token},
};

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: i64,
    /// Body message of the 429 response
    pub message: String,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
            message: "Rate limit exceeded. Please try again later.".to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Per-minute limit taken from `RATE_LIMIT_PER_MINUTE`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_per_minute, 60)
    }

    fn window(&self) -> Duration {
        Duration::try_seconds(self.window_seconds).unwrap_or(Duration::seconds(60))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(100, 60)
    }
}

/// Who a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKey {
    Address(IpAddr),
    Employee(Uuid),
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKey::Address(ip) => write!(f, "address {ip}"),
            ClientKey::Employee(id) => write!(f, "employee {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: DateTime<Utc>,
    used: u32,
}

impl Window {
    fn open(now: DateTime<Utc>) -> Self {
        Self {
            opened_at: now,
            used: 0,
        }
    }

    fn closes_at(&self, length: Duration) -> DateTime<Utc> {
        self.opened_at + length
    }
}

/// Counters shared by every worker.
#[derive(Clone, Default)]
pub struct RateLimitStore {
    windows: Arc<Mutex<HashMap<ClientKey, Window>>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn windows(&self) -> MutexGuard<'_, HashMap<ClientKey, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts one request for `key`. When the window is full, returns how long
    /// until it reopens.
    pub fn admit(&self, key: ClientKey, config: &RateLimitConfig) -> Result<(), Duration> {
        let now = Utc::now();
        let length = config.window();
        let mut windows = self.windows();
        let window = windows.entry(key).or_insert_with(|| Window::open(now));

        if now >= window.closes_at(length) {
            *window = Window::open(now);
        }
        if window.used >= config.max_requests {
            return Err(window.closes_at(length) - now);
        }
        window.used += 1;
        Ok(())
    }

    /// Drops windows opened more than `max_age_seconds` ago.
    pub fn cleanup_expired(&self, max_age_seconds: i64) {
        let cutoff = Utc::now() - Duration::try_seconds(max_age_seconds).unwrap_or_default();
        self.windows().retain(|_, w| w.opened_at > cutoff);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows().len()
    }
}

pub struct RateLimitMiddleware {
    store: RateLimitStore,
    config: RateLimitConfig,
    per_employee: bool,
}

impl RateLimitMiddleware {
    /// Limits by client address with a store private to this middleware.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, RateLimitStore::new())
    }

    pub fn with_store(config: RateLimitConfig, store: RateLimitStore) -> Self {
        Self {
            store,
            config,
            per_employee: false,
        }
    }

    /// Also counts requests against the employee in a valid bearer token.
    pub fn with_authenticated_users(mut self) -> Self {
        self.per_employee = true;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = futures_util::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures_util::future::ready(Ok(RateLimitService {
            service: Rc::new(service),
            store: self.store.clone(),
            config: self.config.clone(),
            per_employee: self.per_employee,
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    store: RateLimitStore,
    config: RateLimitConfig,
    per_employee: bool,
}

/// Employee id from a valid bearer token; anything else counts by address only.
fn authenticated_employee(req: &ServiceRequest) -> Option<Uuid> {
    let token = bearer_token(req.request())?;
    let config = req.app_data::<Data<Config>>()?;
    decode_token(token, &config.jwt_secret).ok().map(|c| c.sub)
}

fn too_many_requests(config: &RateLimitConfig, retry_after: Duration) -> HttpResponse {
    let seconds = retry_after.num_seconds().max(1);
    HttpResponse::TooManyRequests()
        .insert_header((header::RETRY_AFTER, seconds.to_string()))
        .json(ApiResponse::<()>::error(&config.message))
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let store = self.store.clone();
        let config = self.config.clone();
        let per_employee = self.per_employee;

        Box::pin(async move {
            let address = req.peer_addr().map(|addr| ClientKey::Address(addr.ip()));
            let employee = per_employee
                .then(|| authenticated_employee(&req))
                .flatten()
                .map(ClientKey::Employee);

            for key in address.into_iter().chain(employee) {
                if let Err(retry_after) = store.admit(key, &config) {
                    log::warn!(
                        "Rate limit exceeded for {} (request {})",
                        key,
                        req.correlation_id().as_deref().unwrap_or("-")
                    );
                    let response = too_many_requests(&config, retry_after);
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Tighter limits for the unauthenticated auth endpoints.
///
/// Build one per server and clone it into every worker; each clone counts
/// against the same windows.
#[derive(Clone, Default)]
pub struct AuthRateLimiter {
    login: RateLimitStore,
    registration: RateLimitStore,
}

impl AuthRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5 attempts per 5 minutes
    pub fn login(&self) -> RateLimitMiddleware {
        RateLimitMiddleware::with_store(
            RateLimitConfig::new(5, 300)
                .with_message("Too many login attempts. Please try again in 5 minutes."),
            self.login.clone(),
        )
    }

    /// 3 registrations per hour
    pub fn registration(&self) -> RateLimitMiddleware {
        RateLimitMiddleware::with_store(
            RateLimitConfig::new(3, 3600)
                .with_message("Too many registration attempts. Please try again later."),
            self.registration.clone(),
        )
    }

    pub fn stores(&self) -> [RateLimitStore; 2] {
        [self.login.clone(), self.registration.clone()]
    }
}

/// Periodically forgets windows older than an hour.
pub async fn cleanup_rate_limits(store: RateLimitStore, interval_seconds: u64) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));

    loop {
        interval.tick().await;
        let before = store.tracked_clients();
        store.cleanup_expired(3600);
        log::debug!(
            "Rate limit cleanup: {} of {} client windows kept",
            store.tracked_clients(),
            before
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn localhost() -> ClientKey {
        ClientKey::Address(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[test]
    fn config_message_override() {
        let config = RateLimitConfig::new(10, 60).with_message("slow down");
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.message, "slow down");
    }

    #[test]
    fn admits_until_the_window_is_full() {
        let store = RateLimitStore::new();
        let config = RateLimitConfig::new(2, 60);

        assert!(store.admit(localhost(), &config).is_ok());
        assert!(store.admit(localhost(), &config).is_ok());

        let retry_after = store.admit(localhost(), &config).unwrap_err();
        assert!(retry_after > Duration::zero());
        assert!(retry_after <= Duration::seconds(60));
    }

    #[test]
    fn keys_are_counted_separately() {
        let store = RateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);
        let employee = ClientKey::Employee(Uuid::new_v4());

        assert!(store.admit(localhost(), &config).is_ok());
        assert!(store.admit(localhost(), &config).is_err());

        assert!(store.admit(employee, &config).is_ok());
        assert!(store.admit(employee, &config).is_err());
        assert!(store.admit(ClientKey::Employee(Uuid::new_v4()), &config).is_ok());
    }

    #[test]
    fn cleanup_drops_old_windows() {
        let store = RateLimitStore::new();
        let config = RateLimitConfig::new(1, 1);

        store.admit(localhost(), &config).unwrap();
        store.admit(ClientKey::Employee(Uuid::new_v4()), &config).unwrap();
        assert_eq!(store.tracked_clients(), 2);

        store.cleanup_expired(3600);
        assert_eq!(store.tracked_clients(), 2);

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.cleanup_expired(0);
        assert_eq!(store.tracked_clients(), 0);
    }
}

//! GET response cache backed by moka.
//!
//! Keys include a generation counter, the full URI and the caller's
//! `Authorization` header, so every employee sees only responses computed for
//! their own token. Any successful non-GET request passing through a wrapped
//! scope bumps the generation, which orphans every older entry until the TTL
//! evicts it.

use actix_web::{
    Error, HttpResponse,
    body::{BoxBody, MessageBody, to_bytes},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{
        Method, StatusCode,
        header::{self, HeaderMap, HeaderName, HeaderValue},
    },
    web::Bytes,
};
use futures::future::{LocalBoxFuture, Ready, ok};
use moka::future::Cache;
use std::{
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// A successful response as it was first sent.
#[derive(Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedResponse {
    fn capture(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers: headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            body,
        }
    }

    /// Rebuilds the response, tagged with the given `x-cache` marker.
    fn replay(&self, marker: &'static str) -> HttpResponse<BoxBody> {
        let mut builder = HttpResponse::build(self.status);
        for (name, value) in &self.headers {
            builder.insert_header((name.clone(), value.clone()));
        }
        builder
            .insert_header((X_CACHE, marker))
            .body(self.body.clone())
    }
}

const X_CACHE: &str = "x-cache";

/// Shared by every cached scope so a write in one scope invalidates reads in all.
#[derive(Clone)]
pub struct CacheLayer {
    entries: Cache<String, CachedResponse>,
    generation: Arc<AtomicU64>,
}

impl CacheLayer {
    pub fn new(max_capacity: u64, ttl_seconds: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build(),
            generation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Orphans every entry stored so far.
    pub fn bump(&self) {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Response cache generation bumped to {}", next);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn key_for(&self, req: &ServiceRequest) -> String {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        format!("{}|{}|{}", self.generation(), req.uri(), token)
    }
}

pub struct ResponseCacheMiddleware {
    layer: CacheLayer,
}

impl ResponseCacheMiddleware {
    pub fn new(layer: CacheLayer) -> Self {
        Self { layer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCacheMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
    <B as MessageBody>::Error: actix_web::ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ResponseCacheService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ResponseCacheService {
            service: Rc::new(service),
            layer: self.layer.clone(),
        })
    }
}

pub struct ResponseCacheService<S> {
    service: Rc<S>,
    layer: CacheLayer,
}

impl<S, B> Service<ServiceRequest> for ResponseCacheService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
    <B as MessageBody>::Error: actix_web::ResponseError,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let layer = self.layer.clone();

        if req.method() != Method::GET {
            return Box::pin(async move {
                let res = service.call(req).await?;
                if res.status().is_success() {
                    layer.bump();
                }
                Ok(res.map_into_boxed_body())
            });
        }

        let key = layer.key_for(&req);

        Box::pin(async move {
            if let Some(hit) = layer.entries.get(&key).await {
                return Ok(req.into_response(hit.replay("HIT")));
            }

            let (req, res) = service.call(req).await?.into_parts();
            let status = res.status();
            let headers = res.headers().clone();
            let body = to_bytes(res.into_body()).await?;

            let entry = CachedResponse::capture(status, &headers, body);
            let out = entry.replay("MISS");
            if status.is_success() {
                layer.entries.insert(key, entry).await;
            }

            Ok(ServiceResponse::new(req, out))
        })
    }
}

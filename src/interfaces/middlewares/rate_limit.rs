use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, ResponseError,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AppError, limiter::rate_limiter::RateLimiterStore, utils::get_client_ip::get_client_ip};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Per-client-IP request budget for the wrapped scope or resource.
pub struct RateLimit {
    store: RateLimiterStore,
    trust_x_forwarded_for: bool,
}

impl RateLimit {
    pub fn new(store: RateLimiterStore, trust_x_forwarded_for: bool) -> Self {
        RateLimit { store, trust_x_forwarded_for }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitService {
            service: Rc::new(service),
            store: self.store.clone(),
            trust_x_forwarded_for: self.trust_x_forwarded_for,
        })
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    store: RateLimiterStore,
    trust_x_forwarded_for: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let client_ip = get_client_ip(req.request(), self.trust_x_forwarded_for);
        let decision = self.store.check(&client_ip);

        Box::pin(async move {
            if let Some(retry_after) = decision.retry_after.filter(|_| !decision.allowed) {
                tracing::warn!(client_ip = %client_ip, path = %req.path(), retry_after, "Rate limit exceeded");
                let response = AppError::TooManyRequests { retry_after }.error_response();
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?.map_into_left_body();
            let headers = res.headers_mut();
            headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(decision.limit));
            headers.insert(HeaderName::from_static(REMAINING_HEADER), HeaderValue::from(decision.remaining));
            Ok(res)
        })
    }
}

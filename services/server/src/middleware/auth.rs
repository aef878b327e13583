use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::debug;
use sqlx::PgPool;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::config::Config;
use crate::errors::ApiError;
use crate::services::user_service::find_user;
use crate::utils::jwt::{verify_token, TokenType};

/// The caller behind a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub telegram: i64,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .copied()
                .ok_or_else(|| ApiError::unauthorized("Not authenticated")),
        )
    }
}

pub fn bearer_token(req: &ServiceRequest) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid token format"))
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match bearer_token(&req) {
            Ok(token) => token,
            Err(e) => return Box::pin(async move { Err(e.into()) }),
        };

        let (config, pool) = match (
            req.app_data::<web::Data<Config>>().cloned(),
            req.app_data::<web::Data<PgPool>>().cloned(),
        ) {
            (Some(config), Some(pool)) => (config, pool),
            _ => {
                return Box::pin(async {
                    Err(ApiError::internal("auth middleware is missing app state").into())
                })
            }
        };

        let user_id = match verify_token(&token, TokenType::Access, &config.jwt) {
            Ok(id) => id,
            Err(e) => {
                debug!("Rejected access token: {}", e);
                return Box::pin(async move { Err(ApiError::from(e).into()) });
            }
        };

        let service = self.service.clone();
        Box::pin(async move {
            let user = find_user(pool.get_ref(), user_id)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

            req.extensions_mut().insert(AuthUser {
                id: user.id,
                telegram: user.telegram,
            });

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

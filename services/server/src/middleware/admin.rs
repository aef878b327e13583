use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use log::warn;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::config::Config;
use crate::errors::ApiError;
use crate::middleware::auth::AuthUser;

/// Lets through callers whose Telegram id is on the admin list.
/// Must sit inside `AuthMiddleware`.
pub struct AdminMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
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
        let user = match req.extensions().get::<AuthUser>().copied() {
            Some(user) => user,
            None => {
                return Box::pin(async {
                    Err(ApiError::unauthorized("Authentication required").into())
                });
            }
        };

        let allowed = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.is_admin(user.telegram))
            .unwrap_or(false);

        if !allowed {
            warn!("User {} is not an admin", user.id);
            return Box::pin(async { Err(ApiError::forbidden("Admin access required").into()) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

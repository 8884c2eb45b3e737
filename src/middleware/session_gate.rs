/// Session Gate Middleware
///
/// Authorizes each request from its `access` / `refresh` cookies, renewing the
/// access token transparently when it has expired, and injects the signed-in
/// `SessionUser` into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Authenticator, ACCESS_COOKIE, REFRESH_COOKIE};

/// Gate for routes that require a signed-in user
///
/// Rejected requests get `401` with both session cookies cleared.
pub struct SessionGate {
    authenticator: web::Data<Authenticator>,
}

impl SessionGate {
    pub fn new(authenticator: web::Data<Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionGateService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct SessionGateService<S> {
    service: Rc<S>,
    authenticator: web::Data<Authenticator>,
}

impl<S, B> Service<ServiceRequest> for SessionGateService<S>
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
        let access = req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string());
        let refresh = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

        match self
            .authenticator
            .authorize(access.as_deref(), refresh.as_deref())
        {
            Ok(authorization) => {
                tracing::debug!(
                    email = %authorization.user.email,
                    renewed = authorization.renewed.is_some(),
                    "Session authorized"
                );
                req.extensions_mut().insert(authorization.user);

                let renewed = authorization.renewed;
                let service = self.service.clone();
                Box::pin(async move {
                    let mut res = service.call(req).await?;
                    if let Some(cookies) = renewed {
                        cookies.write_to(res.response_mut());
                    }
                    Ok(res)
                })
            }
            Err(rejection) => {
                tracing::warn!(reason = rejection.reason, path = %req.path(), "Session rejected");
                let response = rejection.into_response();
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "Unauthenticated",
                        response,
                    )
                    .into())
                })
            }
        }
    }
}

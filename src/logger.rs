use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures::future::LocalBoxFuture;
use log::info;
use std::rc::Rc;
use std::time::Instant;

use crate::metrics::ServiceMetrics;

/// 커스텀 Logger 미들웨어
/// HTTP 요청과 응답을 로깅하고 요청 수를 집계합니다.
/// Authorization 헤더는 기록하지 않습니다.
pub struct LoggerMiddleware {
    metrics: web::Data<ServiceMetrics>,
}

impl LoggerMiddleware {
    pub fn new(metrics: web::Data<ServiceMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
    metrics: web::Data<ServiceMetrics>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
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
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        // 관리용 경로는 집계하지 않음
        if !path.starts_with("/admin") {
            self.metrics.record_hit();
        }

        info!("Request started: {} {}", method, path);

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;

            let elapsed = start_time.elapsed();
            info!(
                "Request completed: {} {} - Status: {} ({}ms)",
                method,
                path,
                res.status().as_u16(),
                elapsed.as_millis()
            );

            Ok(res)
        })
    }
}

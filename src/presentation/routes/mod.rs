// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::domain::services::delivery_service::DeliveryService;
use crate::domain::services::dispatcher::Dispatcher;
use crate::domain::services::subscription_service::SubscriptionService;
use crate::presentation::handlers::{delivery_handler, event_handler, subscription_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由依赖的服务
pub struct AppServices<S, D>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    pub subscriptions: Arc<SubscriptionService<S>>,
    pub deliveries: Arc<DeliveryService<S, D>>,
    pub dispatcher: Arc<Dispatcher<S, D>>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes<S, D>(services: AppServices<S, D>) -> Router
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let webhook_routes = Router::new()
        .route(
            "/v1/webhooks",
            post(subscription_handler::create_webhook::<S>)
                .get(subscription_handler::list_webhooks::<S>),
        )
        .route(
            "/v1/webhooks/{id}",
            get(subscription_handler::get_webhook::<S>)
                .patch(subscription_handler::update_webhook::<S>)
                .delete(subscription_handler::delete_webhook::<S>),
        )
        .route(
            "/v1/webhooks/{id}/test",
            post(delivery_handler::test_webhook::<S, D>),
        )
        .route(
            "/v1/webhooks/{id}/deliveries",
            get(delivery_handler::list_deliveries::<S, D>),
        )
        .route(
            "/v1/deliveries/{id}/redeliver",
            post(delivery_handler::redeliver::<S, D>),
        )
        .route("/v1/events", post(event_handler::trigger_event::<S, D>))
        .layer(Extension(services.subscriptions))
        .layer(Extension(services.deliveries))
        .layer(Extension(services.dispatcher));

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

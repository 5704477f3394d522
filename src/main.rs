// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use hookrs::config::settings::Settings;
use hookrs::domain::services::delivery_service::DeliveryService;
use hookrs::domain::services::dispatcher::Dispatcher;
use hookrs::domain::services::subscription_service::SubscriptionService;
use hookrs::infrastructure::database::connection;
use hookrs::infrastructure::metrics::init_metrics;
use hookrs::infrastructure::repositories::delivery_repo_impl::DeliveryRepoImpl;
use hookrs::infrastructure::repositories::subscription_repo_impl::SubscriptionRepoImpl;
use hookrs::presentation::routes::{self, AppServices};
use hookrs::queue::delivery_queue::DeliveryQueue;
use hookrs::utils::telemetry;
use hookrs::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting hookrs...");

    let settings = Settings::new()?;
    info!("Configuration loaded");

    init_metrics(&settings.metrics);

    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    connection::run_migrations(db.as_ref()).await?;

    let subscription_repo = Arc::new(SubscriptionRepoImpl::new(db.clone()));
    let delivery_repo = Arc::new(DeliveryRepoImpl::new(db.clone()));

    let (queue, receiver) = DeliveryQueue::bounded(settings.delivery.queue_capacity);

    let dispatcher = Arc::new(Dispatcher::new(
        subscription_repo.clone(),
        delivery_repo.clone(),
        queue.clone(),
    ));
    let subscription_service = Arc::new(SubscriptionService::new(
        subscription_repo.clone(),
        settings.delivery.subscription_defaults(),
    ));
    let delivery_service = Arc::new(DeliveryService::new(
        subscription_repo.clone(),
        delivery_repo.clone(),
        dispatcher.clone(),
    ));

    let mut worker_manager = WorkerManager::new(
        subscription_repo,
        delivery_repo,
        &settings.delivery,
        queue,
        receiver,
    )?;
    worker_manager.start_workers(settings.delivery.worker_count);
    worker_manager.recover_unfinished().await?;

    let app = routes::routes(AppServices {
        subscriptions: subscription_service,
        deliveries: delivery_service,
        dispatcher,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    });

    worker_manager.wait_for_shutdown().await;
    server.await??;

    Ok(())
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DeliverySettings;
use crate::domain::models::webhook::DeliveryStatus;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::queue::delivery_queue::{DeliveryJob, DeliveryQueue, DeliveryReceiver};
use crate::utils::errors::WorkerError;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::delivery_worker::DeliveryWorker;
use crate::workers::worker::Worker;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 启动恢复时单次加载的最大记录数
const RECOVERY_BATCH: u64 = 10_000;

/// 工作管理器
///
/// 负责启动投递工作任务、恢复进程重启前未完成的投递以及关闭
pub struct WorkerManager<S, D>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    deliveries: Arc<D>,
    worker: Arc<DeliveryWorker<S, D>>,
    queue: DeliveryQueue,
    policy: RetryPolicy,
    handles: Vec<JoinHandle<()>>,
}

impl<S, D> WorkerManager<S, D>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    pub fn new(
        subscriptions: Arc<S>,
        deliveries: Arc<D>,
        settings: &DeliverySettings,
        queue: DeliveryQueue,
        receiver: DeliveryReceiver,
    ) -> Result<Self, WorkerError> {
        let worker = DeliveryWorker::new(
            subscriptions,
            deliveries.clone(),
            settings,
            queue.clone(),
            receiver,
        )?;

        Ok(Self {
            deliveries,
            worker: Arc::new(worker),
            queue,
            policy: settings.retry_policy(),
            handles: Vec::new(),
        })
    }

    /// 启动工作进程
    ///
    /// 所有工作任务共享同一个队列接收端，`count` 即最大并发出站请求数
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for id in 0..count {
            let worker = self.worker.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("{} #{} stopped: {}", worker.name(), id, e);
                }
            });
            self.handles.push(handle);
        }
        info!("Started {} delivery workers", count);
    }

    /// 重新调度未完成的投递
    ///
    /// `pending` 记录立即入队（队列满时等待工作器腾出空位，需先启动工作器），
    /// `retrying` 记录在剩余的退避时间之后入队
    ///
    /// # 返回值
    ///
    /// 重新调度的记录数
    pub async fn recover_unfinished(&self) -> Result<usize, WorkerError> {
        let unfinished = self.deliveries.find_unfinished(RECOVERY_BATCH).await?;
        let now = Utc::now();

        for delivery in &unfinished {
            let job = DeliveryJob::new(delivery.id, delivery.attempt_count);
            match delivery.status {
                DeliveryStatus::Retrying => {
                    let due = delivery.updated_at
                        + chrono::Duration::from_std(self.policy.delay_for(delivery.attempt_count))
                            .unwrap_or_else(|_| chrono::Duration::zero());
                    let delay = (due - now).to_std().unwrap_or(Duration::ZERO);
                    self.queue.schedule(job, delay);
                }
                _ => self
                    .queue
                    .send(job)
                    .await
                    .map_err(|e| WorkerError::InternalError(e.to_string()))?,
            }
        }

        if !unfinished.is_empty() {
            info!("Recovered {} unfinished deliveries", unfinished.len());
        }
        Ok(unfinished.len())
    }

    /// 停止所有工作进程
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 队列已关闭
    #[error("Delivery queue closed")]
    Closed,
}

/// 投递任务
///
/// `expected_attempt` 是入队时记录的已尝试次数，工作器据此丢弃过期的重复任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryJob {
    pub delivery_id: Uuid,
    pub expected_attempt: i32,
}

impl DeliveryJob {
    pub fn new(delivery_id: Uuid, expected_attempt: i32) -> Self {
        Self {
            delivery_id,
            expected_attempt,
        }
    }
}

/// 投递队列的接收端，由多个工作器共享
pub type DeliveryReceiver = Arc<Mutex<mpsc::Receiver<DeliveryJob>>>;

/// 有界投递队列
///
/// `enqueue` 永远不会阻塞调用方：队列已满时由一个独立任务等待空位。
/// 这些等待任务本身不受容量限制，只适合请求路径上的突发流量；
/// 批量入队（如启动恢复）应使用 `send` 直接等待空位。
#[derive(Clone)]
pub struct DeliveryQueue {
    sender: mpsc::Sender<DeliveryJob>,
}

impl DeliveryQueue {
    /// 创建有界队列
    ///
    /// # 参数
    ///
    /// * `capacity` - 队列容量
    ///
    /// # 返回值
    ///
    /// 返回队列和共享的接收端
    pub fn bounded(capacity: usize) -> (Self, DeliveryReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }

    /// 入队投递任务
    pub fn enqueue(&self, job: DeliveryJob) -> Result<(), QueueError> {
        match self.sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                debug!("Delivery queue full, deferring {}", job.delivery_id);
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if sender.send(job).await.is_err() {
                        warn!("Delivery queue closed before {} was queued", job.delivery_id);
                    }
                });
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// 入队投递任务，队列已满时等待空位
    pub async fn send(&self, job: DeliveryJob) -> Result<(), QueueError> {
        self.sender.send(job).await.map_err(|_| QueueError::Closed)
    }

    /// 延迟入队
    ///
    /// 保证至少等待 `delay` 后才入队，不保证精确时间
    pub fn schedule(&self, job: DeliveryJob, delay: Duration) {
        let queue = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            if let Err(e) = queue.enqueue(job) {
                warn!("Failed to requeue delivery {}: {}", job.delivery_id, e);
            }
        });
    }

    /// 队列是否已关闭
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

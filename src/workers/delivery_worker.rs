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

use crate::config::settings::DeliverySettings;
use crate::domain::models::webhook::{
    DeliveryStatus, WebhookDelivery, WebhookEnvelope, WebhookSubscription,
};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::queue::delivery_queue::{DeliveryJob, DeliveryQueue, DeliveryReceiver};
use crate::utils::errors::{DeliveryError, WorkerError};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::signature::{self, SIGNATURE_HEADER};
use crate::utils::text_processing::truncate_chars;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 事件类型请求头
pub const EVENT_HEADER: &str = "X-Webhook-Event";
/// 投递ID请求头
pub const DELIVERY_HEADER: &str = "X-Webhook-Delivery";

/// 订阅方自定义请求头不能覆盖的请求头
const RESERVED_HEADERS: [&str; 4] = [
    "content-type",
    "x-webhook-signature",
    "x-webhook-event",
    "x-webhook-delivery",
];

/// 跳过投递的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 投递记录不存在
    DeliveryMissing,
    /// 投递已进入终态
    Terminal,
    /// 任务记录的尝试次数已过期
    Stale,
    /// 订阅已删除或已停用
    SubscriptionInactive,
    /// 另一个工作器已占用本次尝试
    ClaimLost,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::DeliveryMissing => "delivery_missing",
            SkipReason::Terminal => "terminal",
            SkipReason::Stale => "stale",
            SkipReason::SubscriptionInactive => "subscription_inactive",
            SkipReason::ClaimLost => "claim_lost",
        }
    }
}

/// 一次尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 投递成功
    Delivered,
    /// 投递失败，需要在 `delay` 之后执行 `next`
    Retrying { next: DeliveryJob, delay: Duration },
    /// 重试次数已用尽
    Failed,
    /// 未发送请求也未修改记录
    Skipped(SkipReason),
}

/// Webhook投递工作器
///
/// 多个工作任务共享同一个接收端，每次只处理一个投递任务。
/// 失败的投递通过队列的延迟入队重新调度，不在工作任务内等待。
pub struct DeliveryWorker<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    subscriptions: Arc<S>,
    deliveries: Arc<D>,
    client: Client,
    policy: RetryPolicy,
    response_body_limit: usize,
    queue: DeliveryQueue,
    receiver: DeliveryReceiver,
}

impl<S, D> DeliveryWorker<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    /// 创建新的投递工作器实例
    ///
    /// # 参数
    ///
    /// * `subscriptions` - 订阅仓库
    /// * `deliveries` - 投递仓库
    /// * `settings` - 投递配置
    /// * `queue` - 投递队列，用于调度重试
    /// * `receiver` - 投递队列的共享接收端
    pub fn new(
        subscriptions: Arc<S>,
        deliveries: Arc<D>,
        settings: &DeliverySettings,
        queue: DeliveryQueue,
        receiver: DeliveryReceiver,
    ) -> Result<Self, WorkerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|e| WorkerError::InternalError(format!("invalid user agent: {}", e)))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WorkerError::InternalError(e.to_string()))?;

        Ok(Self {
            subscriptions,
            deliveries,
            client,
            policy: settings.retry_policy(),
            response_body_limit: settings.response_body_limit,
            queue,
            receiver,
        })
    }

    /// 按记录中当前的尝试次数执行一次投递
    pub async fn attempt(&self, delivery_id: Uuid) -> Result<AttemptOutcome, WorkerError> {
        match self.deliveries.find_by_id(delivery_id).await? {
            Some(delivery) => {
                self.attempt_job(DeliveryJob::new(delivery_id, delivery.attempt_count))
                    .await
            }
            None => Ok(self.skip(delivery_id, SkipReason::DeliveryMissing)),
        }
    }

    /// 执行一个投递任务
    ///
    /// 先以 `expected_attempt` 占用本次尝试，占用失败说明已有其他工作器处理，
    /// 直接跳过，不发送请求。
    pub async fn attempt_job(&self, job: DeliveryJob) -> Result<AttemptOutcome, WorkerError> {
        let Some(mut delivery) = self.deliveries.find_by_id(job.delivery_id).await? else {
            return Ok(self.skip(job.delivery_id, SkipReason::DeliveryMissing));
        };
        if delivery.status.is_terminal() {
            return Ok(self.skip(delivery.id, SkipReason::Terminal));
        }
        if delivery.attempt_count != job.expected_attempt {
            return Ok(self.skip(delivery.id, SkipReason::Stale));
        }

        let subscription = match self.subscriptions.find_by_id(delivery.webhook_id).await? {
            Some(sub) if sub.is_active => sub,
            _ => return Ok(self.skip(delivery.id, SkipReason::SubscriptionInactive)),
        };

        if !self
            .policy
            .should_retry(delivery.attempt_count, subscription.retry_count)
        {
            return self.close_exhausted(delivery).await;
        }

        if !self
            .deliveries
            .claim_attempt(delivery.id, job.expected_attempt)
            .await?
        {
            return Ok(self.skip(delivery.id, SkipReason::ClaimLost));
        }
        delivery.attempt_count = job.expected_attempt + 1;

        let result = self.send(&subscription, &delivery).await?;
        self.record(subscription, delivery, result).await
    }

    /// 发送请求并返回响应状态码和截断后的响应体
    async fn send(
        &self,
        subscription: &WebhookSubscription,
        delivery: &WebhookDelivery,
    ) -> Result<Result<(u16, String), DeliveryError>, WorkerError> {
        info!(
            "Delivering webhook {} to {} (attempt {})",
            delivery.id, subscription.url, delivery.attempt_count
        );
        counter!("webhook_delivery_attempts_total").increment(1);

        let now = Utc::now();
        let body = serde_json::to_vec(&WebhookEnvelope::for_delivery(delivery, now))?;
        let signature = signature::sign(&subscription.secret, &body, now.timestamp());

        let mut headers = self.custom_headers(subscription);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        insert_header(&mut headers, SIGNATURE_HEADER, &signature)?;
        insert_header(&mut headers, EVENT_HEADER, delivery.event_type.as_str())?;
        insert_header(&mut headers, DELIVERY_HEADER, &delivery.id.to_string())?;

        let start = Instant::now();
        let response = self
            .client
            .post(&subscription.url)
            .headers(headers)
            .body(body)
            .timeout(Duration::from_millis(subscription.timeout_ms.max(1) as u64))
            .send()
            .await;

        let result = match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                // An unreadable body still counts as a response; keep the status.
                let text = resp.text().await.unwrap_or_default();
                Ok((status, truncate_chars(&text, self.response_body_limit)))
            }
            Err(e) if e.is_timeout() => Err(DeliveryError::Timeout(subscription.timeout_ms)),
            Err(e) => Err(DeliveryError::Transport(e.to_string())),
        };
        histogram!("webhook_delivery_duration_seconds").record(start.elapsed().as_secs_f64());

        Ok(result)
    }

    async fn record(
        &self,
        subscription: WebhookSubscription,
        mut delivery: WebhookDelivery,
        result: Result<(u16, String), DeliveryError>,
    ) -> Result<AttemptOutcome, WorkerError> {
        let success = match result {
            Ok((status, body)) => {
                delivery.response_status = Some(i32::from(status));
                delivery.response_body = Some(body);
                if (200..300).contains(&status) {
                    delivery.error_message = None;
                    delivery.delivered_at = Some(Utc::now());
                    true
                } else {
                    delivery.error_message = Some(DeliveryError::HttpStatus(status).to_string());
                    counter!("webhook_delivery_failed_total", "reason" => "http_error")
                        .increment(1);
                    false
                }
            }
            Err(e) => {
                let reason = match e {
                    DeliveryError::Timeout(_) => "timeout",
                    _ => "network_error",
                };
                counter!("webhook_delivery_failed_total", "reason" => reason).increment(1);
                delivery.error_message = Some(e.to_string());
                false
            }
        };

        delivery.status = DeliveryStatus::after_attempt(
            success,
            delivery.attempt_count,
            subscription.retry_count,
        );
        delivery.updated_at = Utc::now();

        if !self.deliveries.record_outcome(&delivery).await? {
            warn!(
                "Delivery {} changed during attempt {}, outcome discarded",
                delivery.id, delivery.attempt_count
            );
            return Ok(AttemptOutcome::Skipped(SkipReason::ClaimLost));
        }

        let outcome = match delivery.status {
            DeliveryStatus::Delivered => {
                info!("Webhook {} delivered successfully", delivery.id);
                counter!("webhook_delivery_success_total").increment(1);
                AttemptOutcome::Delivered
            }
            DeliveryStatus::Retrying => {
                let delay = self.policy.delay_for(delivery.attempt_count);
                warn!(
                    "Webhook {} attempt {}/{} failed, retrying in {:?}",
                    delivery.id, delivery.attempt_count, subscription.retry_count, delay
                );
                AttemptOutcome::Retrying {
                    next: DeliveryJob::new(delivery.id, delivery.attempt_count),
                    delay,
                }
            }
            _ => {
                error!(
                    "Webhook {} failed after {} attempts",
                    delivery.id, delivery.attempt_count
                );
                counter!("webhook_delivery_exhausted_total").increment(1);
                AttemptOutcome::Failed
            }
        };
        Ok(outcome)
    }

    /// 尝试次数已达上限但记录仍未结束（例如进程在两次写入之间退出），直接标记失败
    async fn close_exhausted(
        &self,
        mut delivery: WebhookDelivery,
    ) -> Result<AttemptOutcome, WorkerError> {
        delivery.status = DeliveryStatus::Failed;
        if delivery.error_message.is_none() {
            delivery.error_message = Some("retry limit reached".to_string());
        }
        delivery.updated_at = Utc::now();

        if self.deliveries.record_outcome(&delivery).await? {
            counter!("webhook_delivery_exhausted_total").increment(1);
            Ok(AttemptOutcome::Failed)
        } else {
            Ok(self.skip(delivery.id, SkipReason::ClaimLost))
        }
    }

    fn custom_headers(&self, subscription: &WebhookSubscription) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(custom) = &subscription.headers else {
            return headers;
        };

        for (name, value) in custom {
            if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                debug!("Ignoring reserved header {} on webhook {}", name, subscription.id);
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("Ignoring invalid header {} on webhook {}", name, subscription.id),
            }
        }
        headers
    }

    fn skip(&self, delivery_id: Uuid, reason: SkipReason) -> AttemptOutcome {
        debug!("Skipping delivery {}: {}", delivery_id, reason.as_str());
        counter!("webhook_delivery_skipped_total", "reason" => reason.as_str()).increment(1);
        AttemptOutcome::Skipped(reason)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), WorkerError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| WorkerError::InternalError(format!("invalid header name {}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| WorkerError::InternalError(format!("invalid {} header: {}", name, e)))?;
    headers.insert(header_name, value);
    Ok(())
}

#[async_trait]
impl<S, D> Worker for DeliveryWorker<S, D>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Delivery worker started");
        loop {
            let job = { self.receiver.lock().await.recv().await };
            let Some(job) = job else {
                info!("Delivery queue closed, worker exiting");
                return Ok(());
            };

            match self.attempt_job(job).await {
                Ok(AttemptOutcome::Retrying { next, delay }) => self.queue.schedule(next, delay),
                Ok(_) => {}
                // The row is left open; startup recovery picks it up again.
                Err(e) => error!("Delivery {} failed: {}", job.delivery_id, e),
            }
        }
    }

    fn name(&self) -> &str {
        "delivery_worker"
    }
}

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

use crate::domain::services::subscription_service::SubscriptionDefaults;
use crate::utils::retry_policy::{BackoffStrategy, RetryPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、指标和投递等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 投递配置
    pub delivery: DeliverySettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

/// 投递配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DeliverySettings {
    /// 投递工作器数量
    pub worker_count: usize,
    /// 投递队列容量
    pub queue_capacity: usize,
    /// 重试基础延迟（毫秒）
    pub retry_base_delay_ms: u64,
    /// 退避策略
    pub backoff: BackoffStrategy,
    /// 最大重试延迟（毫秒）
    pub max_backoff_ms: u64,
    /// 响应体保存的最大字符数
    pub response_body_limit: usize,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 新订阅的默认最大投递次数
    pub default_retry_count: i32,
    /// 新订阅的默认超时（毫秒）
    pub default_timeout_ms: i32,
}

impl DeliverySettings {
    /// 构建重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
            strategy: self.backoff,
        }
    }

    /// 新订阅的默认值
    pub fn subscription_defaults(&self) -> SubscriptionDefaults {
        SubscriptionDefaults {
            retry_count: self.default_retry_count,
            timeout_ms: self.default_timeout_ms,
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败或取值无效
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default metrics settings
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            // Default delivery settings
            .set_default("delivery.worker_count", 4)?
            .set_default("delivery.queue_capacity", 1024)?
            .set_default("delivery.retry_base_delay_ms", 5000)?
            .set_default("delivery.backoff", "linear")?
            .set_default("delivery.max_backoff_ms", 300_000)?
            .set_default("delivery.response_body_limit", 1000)?
            .set_default("delivery.user_agent", "Hookrs-Webhooks/0.1.0")?
            .set_default("delivery.default_retry_count", 3)?
            .set_default("delivery.default_timeout_ms", 5000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("HOOKRS").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delivery = &self.delivery;
        if delivery.worker_count == 0 {
            return Err(ConfigError::Message(
                "delivery.worker_count must be at least 1".to_string(),
            ));
        }
        if delivery.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "delivery.queue_capacity must be at least 1".to_string(),
            ));
        }
        if delivery.max_backoff_ms == 0 {
            return Err(ConfigError::Message(
                "delivery.max_backoff_ms must be positive".to_string(),
            ));
        }
        if delivery.response_body_limit == 0 {
            return Err(ConfigError::Message(
                "delivery.response_body_limit must be at least 1".to_string(),
            ));
        }
        if delivery.default_retry_count < 1 {
            return Err(ConfigError::Message(
                "delivery.default_retry_count must be at least 1".to_string(),
            ));
        }
        if delivery.default_timeout_ms < 1 {
            return Err(ConfigError::Message(
                "delivery.default_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Deserialize;
use std::time::Duration;

/// 退避策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// 延迟 = 基础延迟 * 已尝试次数
    #[default]
    Linear,
    /// 延迟 = 基础延迟 * 2^(已尝试次数 - 1)
    Exponential,
}

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 基础退避时间
    pub base_delay: Duration,
    /// 最大退避时间
    pub max_delay: Duration,
    /// 退避策略
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(5000),
            max_delay: Duration::from_secs(300),
            strategy: BackoffStrategy::Linear,
        }
    }
}

impl RetryPolicy {
    /// 创建线性重试策略
    pub fn linear(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// 计算下次重试前的等待时间
    ///
    /// `attempt_count` 为已完成的尝试次数（从1开始）
    pub fn delay_for(&self, attempt_count: i32) -> Duration {
        let attempts = attempt_count.max(1) as u32;
        let delay = match self.strategy {
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempts),
            BackoffStrategy::Exponential => {
                let factor = 2u32.checked_pow(attempts - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };

        delay.min(self.max_delay)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt_count: i32, retry_limit: i32) -> bool {
        attempt_count < retry_limit
    }
}

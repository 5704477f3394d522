// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志格式环境变量，取值 `json` 时输出结构化日志
pub const LOG_FORMAT_ENV: &str = "HOOKRS_LOG_FORMAT";

/// 初始化日志
///
/// 日志级别由 `RUST_LOG` 控制，未设置时使用 `info,hookrs=debug`。
/// 重复调用不会报错，返回是否由本次调用完成安装。
pub fn init_telemetry() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,hookrs=debug".into());
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    }
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 启动Prometheus导出器并注册投递相关指标。未启用时不安装记录器，指标调用为空操作。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "webhook_dispatch_total",
        "Total number of deliveries created by event dispatch"
    );
    describe_counter!(
        "webhook_delivery_attempts_total",
        "Total number of outbound delivery attempts"
    );
    describe_counter!(
        "webhook_delivery_success_total",
        "Total number of deliveries that reached the delivered state"
    );
    describe_counter!(
        "webhook_delivery_failed_total",
        "Total number of failed delivery attempts by reason"
    );
    describe_counter!(
        "webhook_delivery_exhausted_total",
        "Total number of deliveries that exhausted their retries"
    );
    describe_counter!(
        "webhook_delivery_skipped_total",
        "Total number of delivery jobs skipped without sending by reason"
    );
    describe_histogram!(
        "webhook_delivery_duration_seconds",
        "Duration of outbound delivery requests in seconds"
    );
}

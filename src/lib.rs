// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含API请求和响应的数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含订阅与投递模型、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供数据库连接、仓库实现和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和提取器
pub mod presentation;

/// 队列模块
///
/// 实现有界投递队列和延迟重试
pub mod queue;

/// 工具模块
///
/// 提供签名、重试策略、日志等通用功能
pub mod utils;

/// 工作器模块
///
/// 实现投递工作器和工作器管理
pub mod workers;

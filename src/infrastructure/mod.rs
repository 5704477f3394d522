// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 负责与外部系统的交互，依赖领域层定义的仓库接口。
///
/// 包含的子模块：
/// - 数据库（database）：数据库连接、迁移和实体映射
/// - 指标（metrics）：Prometheus指标导出
/// - 仓库实现（repositories）：领域仓库接口的SeaORM实现
pub mod database;
pub mod metrics;
pub mod repositories;

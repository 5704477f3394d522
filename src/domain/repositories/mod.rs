// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的仓库接口，具体实现由基础设施层提供：
/// - 订阅仓库（subscription_repository）：管理Webhook订阅
/// - 投递仓库（delivery_repository）：管理投递记录与重试状态
pub mod delivery_repository;
pub mod subscription_repository;

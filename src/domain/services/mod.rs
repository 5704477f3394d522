// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 订阅服务（subscription_service）：订阅的增删改查和密钥生成
/// - 事件分发（dispatcher）：把事件扇出为投递记录并入队
/// - 投递服务（delivery_service）：投递历史、重新投递和测试投递
pub mod delivery_service;
pub mod dispatcher;
pub mod subscription_service;

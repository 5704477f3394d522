// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 网络钩子（webhook）：订阅、投递记录、事件类型和请求体
pub mod webhook;

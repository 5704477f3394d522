// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供投递工作器和工作器管理功能
/// 包括请求签名发送、重试调度、启动恢复和生命周期管理
pub mod delivery_worker;
pub mod manager;
pub mod worker;

pub use worker::Worker;

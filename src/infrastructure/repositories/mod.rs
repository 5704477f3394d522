// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于 SeaORM 的订阅仓库和投递仓库实现
pub mod delivery_repo_impl;
pub mod subscription_repo_impl;

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// 记录未找到
    #[error("Record not found")]
    NotFound,

    /// 存储的数据无法转换为领域模型
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Webhook管理错误类型
///
/// 订阅管理相关的错误会直接返回给API调用方
#[derive(Error, Debug)]
pub enum WebhookError {
    /// 订阅参数无效，不会重试
    #[error("validation failed: {0}")]
    Validation(String),

    /// 记录不存在或不属于调用方
    #[error("webhook not found")]
    NotFound,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 投递传输错误
///
/// 仅记录在投递记录上并驱动重试，不会抛给任何调用方
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("request timed out after {0} ms")]
    Timeout(i32),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("序列化错误: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    InternalError(String),
}

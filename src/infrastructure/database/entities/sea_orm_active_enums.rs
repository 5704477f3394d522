// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::DeliveryStatus;
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaDeliveryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "retrying")]
    Retrying,
}

impl From<DeliveryStatus> for SeaDeliveryStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Pending => SeaDeliveryStatus::Pending,
            DeliveryStatus::Delivered => SeaDeliveryStatus::Delivered,
            DeliveryStatus::Failed => SeaDeliveryStatus::Failed,
            DeliveryStatus::Retrying => SeaDeliveryStatus::Retrying,
        }
    }
}

impl From<SeaDeliveryStatus> for DeliveryStatus {
    fn from(status: SeaDeliveryStatus) -> Self {
        match status {
            SeaDeliveryStatus::Pending => DeliveryStatus::Pending,
            SeaDeliveryStatus::Delivered => DeliveryStatus::Delivered,
            SeaDeliveryStatus::Failed => DeliveryStatus::Failed,
            SeaDeliveryStatus::Retrying => DeliveryStatus::Retrying,
        }
    }
}

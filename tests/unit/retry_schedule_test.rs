// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hookrs::domain::models::webhook::DeliveryStatus;
use hookrs::utils::retry_policy::{BackoffStrategy, RetryPolicy};
use std::time::Duration;

#[test]
fn test_default_schedule_is_linear_five_seconds() {
    let policy = RetryPolicy::default();
    let delays: Vec<Duration> = (1..=3).map(|n| policy.delay_for(n)).collect();

    assert_eq!(
        delays,
        vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(15)
        ]
    );
}

#[test]
fn test_exponential_schedule_is_capped() {
    let policy = RetryPolicy {
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(10),
        strategy: BackoffStrategy::Exponential,
    };

    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    assert_eq!(policy.delay_for(10), Duration::from_secs(10));
}

#[test]
fn test_retry_limit_of_one_fails_immediately() {
    assert_eq!(
        DeliveryStatus::after_attempt(false, 1, 1),
        DeliveryStatus::Failed
    );
    assert_eq!(
        DeliveryStatus::after_attempt(true, 1, 1),
        DeliveryStatus::Delivered
    );
}

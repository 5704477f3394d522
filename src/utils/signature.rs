// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 签名请求头名称
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// 签名校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// 签名头格式错误
    #[error("malformed signature header")]
    Malformed,
    /// 时间戳超出容忍窗口
    #[error("signature timestamp outside tolerance")]
    Expired,
    /// 摘要不匹配
    #[error("signature mismatch")]
    Mismatch,
}

fn keyed_mac(secret: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

/// 为请求体生成签名
///
/// 签名覆盖 `"<timestamp>." + body`，格式为 `t=<unix_ts>,v1=<hex_digest>`，
/// 接收方可以据此拒绝重放的请求。
///
/// # 参数
///
/// * `secret` - 订阅密钥
/// * `body` - 实际发送的请求体字节
/// * `timestamp` - Unix时间戳（秒）
pub fn sign(secret: &str, body: &[u8], timestamp: i64) -> String {
    let digest = keyed_mac(secret, timestamp, body).finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(digest))
}

/// 校验签名头
///
/// 供接收方使用。任意一个 `v1` 摘要匹配即视为通过，比较使用常量时间。
///
/// # 参数
///
/// * `secret` - 订阅密钥
/// * `body` - 收到的原始请求体
/// * `header` - `X-Webhook-Signature` 的值
/// * `tolerance` - 允许的时间偏差
/// * `now` - 当前时间
pub fn verify(
    secret: &str,
    body: &[u8],
    header: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut digests = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=').ok_or(SignatureError::Malformed)?;
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::Malformed)?,
                )
            }
            "v1" => digests.push(hex::decode(value).map_err(|_| SignatureError::Malformed)?),
            // Unknown schemes are ignored so newer senders stay compatible
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if digests.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let tolerance_secs = u64::try_from(tolerance.num_seconds()).unwrap_or(0);
    match now.timestamp().checked_sub(timestamp).map(i64::unsigned_abs) {
        Some(skew) if skew <= tolerance_secs => {}
        _ => return Err(SignatureError::Expired),
    }

    let matched = digests
        .iter()
        .any(|digest| keyed_mac(secret, timestamp, body).verify_slice(digest).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

use crate::errors::{PayError, Result};
use encoding_rs::Encoding;
use rand::Rng;
use std::thread::sleep;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

pub fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// 请求序列号: 当前毫秒时间戳 + 5位随机数
pub fn gen_request_sn() -> String {
    let mut rng = rand::thread_rng();
    format!("{}{}", now_millis(), rng.gen_range(10000..99999))
}

/// Percent-encode `text` after encoding it with `charset`.
pub fn url_encode(text: &str, charset: &'static Encoding) -> String {
    let (bytes, _, _) = charset.encode(text);
    urlencoding::encode_binary(&bytes).into_owned()
}

/// Runs `f` up to `attempts` times, sleeping `base_delay * n` after the n-th
/// failure. No sleep follows the last attempt.
pub fn retry_linear<T, F>(attempts: usize, base_delay: Duration, mut f: F) -> Result<T>
where
    F: FnMut(usize) -> Result<T>,
{
    let mut last_error = None;
    for attempt in 1..=attempts {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!(attempt, error = %e, "attempt failed");
                last_error = Some(e);
            }
        }
        if attempt < attempts {
            sleep(base_delay * attempt as u32);
        }
    }
    let source = last_error.unwrap_or_else(|| PayError::Validation("attempts must be > 0".into()));
    Err(PayError::RetryExhausted {
        attempts,
        source: Box::new(source),
    })
}

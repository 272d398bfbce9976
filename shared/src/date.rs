//! 时间字段模块
//!
//! 后端以不带时区的 `LocalDateTime` 形式返回时间（如 `2024-05-01T09:30:00`，
//! 可能带小数秒），也可能由代理改写为 RFC 3339。
//! 这里统一解析为 `NaiveDateTime`，解析失败时视为缺失而不是报错。

use chrono::{DateTime, NaiveDateTime};

/// 序列化时使用的格式
pub const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// 解析后端时间字符串
///
/// # 返回
/// - `Some(NaiveDateTime)` 如果是 LocalDateTime 或 RFC 3339 格式
/// - `None` 其他情况
pub fn parse_local(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, LOCAL_DATE_TIME_FORMAT) {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

pub fn format_local(dt: &NaiveDateTime) -> String {
    dt.format(LOCAL_DATE_TIME_FORMAT).to_string()
}

/// `#[serde(with = "date::lenient")]` 用于 `Option<NaiveDateTime>` 字段
pub mod lenient {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_local(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_local))
    }
}

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;

/// 时间戳的线上格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// RFC 822，默认格式：`Mon, 02 Jan 2006 15:04:05 GMT`
    #[default]
    Rfc822,
    /// ISO 8601：`2006-01-02T15:04:05Z`
    Iso8601,
    /// Unix 秒
    UnixSeconds,
}

/// 按给定格式输出时间戳；零值时间戳视为未设置
pub fn format_time(t: &DateTime<Utc>, format: TimestampFormat) -> Option<String> {
    if t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0 {
        return None;
    }
    Some(match format {
        TimestampFormat::Rfc822 => t.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        TimestampFormat::Iso8601 => t.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        TimestampFormat::UnixSeconds => t.timestamp().to_string(),
    })
}

/// 写方向的标量取值转换
///
/// `None` 表示"值未设置"，调用侧据此省略该字段。
/// 不支持的字段类型在派生宏处直接成为编译错误，因此这里无失败路径。
pub trait ToWire {
    fn to_wire(&self) -> Option<String>;
}

impl ToWire for String {
    fn to_wire(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Option<String> {
        Some(if *self { "true" } else { "false" }.to_string())
    }
}

macro_rules! to_wire_display {
    ($($ty:ty),*) => {
        $(impl ToWire for $ty {
            fn to_wire(&self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

to_wire_display!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// 字节序列按 base64 上线，空序列省略
impl ToWire for Vec<u8> {
    fn to_wire(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(BASE64.encode(self))
        }
    }
}

/// 不透明 JSON 值按 JSON 文本上线，null 省略
impl ToWire for serde_json::Value {
    fn to_wire(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Option<String> {
        self.as_ref().and_then(ToWire::to_wire)
    }
}

/// JSON 值绑定到 header 时额外做 base64 包装（header 须 7-bit 安全）
pub fn json_header_value(v: &serde_json::Value) -> Option<String> {
    if v.is_null() {
        return None;
    }
    Some(BASE64.encode(v.to_string()))
}

/// 请求体字段转为 JSON 值；null（未设置的 Option）省略
pub fn json_field<T: Serialize>(field: &str, value: &T) -> Result<Option<serde_json::Value>, ApiError> {
    let v = serde_json::to_value(value).map_err(|e| ApiError::serialization(field, e))?;
    if v.is_null() { Ok(None) } else { Ok(Some(v)) }
}

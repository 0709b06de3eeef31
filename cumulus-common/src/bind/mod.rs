pub mod path;
pub mod value;

pub use path::{clean_path, encode_query, escape_path};
pub use value::{TimestampFormat, ToWire, format_time, json_field, json_header_value};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ApiError;
use crate::request::HttpRequest;

/// 类型化输入的擦除接口
///
/// 由 `cumulus-macro` 的 `#[derive(ApiInput)]` 生成实现；
/// 手写实现同样合法（测试中常用）。
pub trait ApiInput: Send + Sync {
    /// 把带标注的字段写入 HTTP 请求面（路径、查询、header）
    fn write_request(&self, b: &mut RequestBinder<'_>) -> Result<(), ApiError>;

    /// 组装请求体字段为 JSON 值；无请求体字段时返回 `None`
    fn body_json(&self) -> Result<Option<serde_json::Value>, ApiError>;
}

/// 类型化输出的擦除接口
pub trait ApiOutput: Send {
    /// 从响应面（header、原始体、状态）回填带标注的字段
    fn read_response(&mut self, r: &ResponseView<'_>) -> Result<(), ApiError>;

    /// 将响应体 JSON 解码进自身；空体为空操作
    fn unmarshal_json(&mut self, data: &[u8]) -> Result<(), ApiError>;
}

/// 写方向绑定器：派生代码通过它落盘路径占位符、查询与 header
pub struct RequestBinder<'a> {
    http: &'a mut HttpRequest,
}

impl<'a> RequestBinder<'a> {
    pub fn new(http: &'a mut HttpRequest) -> Self {
        Self { http }
    }

    /// 替换路径模板中的 `{name}` / `{name+}` 占位符
    ///
    /// `{name}` 会编码值内的 `/`；`{name+}` 保留它。
    pub fn path_param(&mut self, name: &str, value: &str) {
        let greedy = format!("{{{name}+}}");
        if self.http.path.contains(&greedy) {
            self.http.path = self
                .http
                .path
                .replace(&greedy, &escape_path(value, false));
        }
        let plain = format!("{{{name}}}");
        if self.http.path.contains(&plain) {
            self.http.path = self.http.path.replace(&plain, &escape_path(value, true));
        }
    }

    /// 标量查询参数；`None` 省略
    pub fn query_scalar(&mut self, name: &str, value: Option<String>) {
        if let Some(v) = value {
            self.http.query.push((name.to_string(), v));
        }
    }

    /// 标量序列：单键、逗号连接；空序列省略
    pub fn query_list(&mut self, name: &str, values: Vec<String>) {
        if !values.is_empty() {
            self.http.query.push((name.to_string(), values.join(",")));
        }
    }

    /// 可选标量序列：同键多条目，空值跳过
    pub fn query_multi(&mut self, name: &str, values: Vec<Option<String>>) {
        for v in values.into_iter().flatten() {
            self.http.query.push((name.to_string(), v));
        }
    }

    /// 映射：每个键一个条目
    pub fn query_map(&mut self, entries: Vec<(String, String)>) {
        for (k, v) in entries {
            if !v.is_empty() {
                self.http.query.push((k, v));
            }
        }
    }

    /// 设置/追加 header，值两侧空白裁剪
    pub fn header(&mut self, name: &str, value: &str) -> Result<(), ApiError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::serialization(&name.to_lowercase(), e))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| ApiError::serialization(name.as_str(), e))?;
        self.http.headers.append(name, value);
        Ok(())
    }
}

/// 读方向的响应视图
pub struct ResponseView<'a> {
    status: u16,
    headers: &'a HeaderMap,
    body: &'a [u8],
}

impl<'a> ResponseView<'a> {
    pub fn new(status: u16, headers: &'a HeaderMap, body: &'a [u8]) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Go 风格的状态行文本，如 `404 Not Found`
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, crate::request::status_text(self.status))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpRequest;
    use reqwest::Method;

    fn http(path: &str) -> HttpRequest {
        let mut h = HttpRequest::new(Method::GET, "https://h".to_string());
        h.path = path.to_string();
        h
    }

    #[test]
    fn test_path_param_encodes_separator() {
        let mut h = http("/x/{k}");
        let mut b = RequestBinder::new(&mut h);
        b.path_param("k", "a b/c");
        assert_eq!(h.path, "/x/a%20b%2Fc");
    }

    #[test]
    fn test_greedy_path_param_preserves_separator() {
        let mut h = http("/x/{k+}");
        let mut b = RequestBinder::new(&mut h);
        b.path_param("k", "a b/c");
        assert_eq!(h.path, "/x/a%20b/c");
    }

    #[test]
    fn test_query_shapes() {
        let mut h = http("/");
        let mut b = RequestBinder::new(&mut h);
        b.query_scalar("s", Some("1".into()));
        b.query_scalar("omitted", None);
        b.query_list("l", vec!["a".into(), "b".into()]);
        b.query_list("empty", vec![]);
        b.query_multi("m", vec![Some("x".into()), None, Some("y".into())]);
        b.query_map(vec![("k1".into(), "v1".into()), ("k2".into(), String::new())]);

        assert_eq!(
            h.query,
            vec![
                ("s".to_string(), "1".to_string()),
                ("l".to_string(), "a,b".to_string()),
                ("m".to_string(), "x".to_string()),
                ("m".to_string(), "y".to_string()),
                ("k1".to_string(), "v1".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_trims_whitespace() {
        let mut h = http("/");
        let mut b = RequestBinder::new(&mut h);
        b.header("X-Test", "  padded  ").unwrap();
        assert_eq!(h.headers.get("X-Test").unwrap(), "padded");
    }

    #[test]
    fn test_response_view_reads() {
        let mut headers = HeaderMap::new();
        headers.insert("Location", "/jobs/42".parse().unwrap());
        let body = b"raw";
        let view = ResponseView::new(404, &headers, body);

        assert_eq!(view.header("Location"), Some("/jobs/42"));
        assert_eq!(view.status(), 404);
        assert_eq!(view.status_line(), "404 Not Found");
        assert_eq!(view.body(), b"raw");
    }
}

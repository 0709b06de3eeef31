/// URL 路径与查询串的转义规则
///
/// 保留字符集为规范的 unreserved 集合 `[A-Za-z0-9-._~]`，
/// 其余字节一律大写百分号编码。

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// 转义一个路径片段
///
/// `encode_sep` 为 true 时 `/` 也被编码（`{name}` 占位符语义）；
/// 为 false 时 `/` 原样保留（`{name+}` 占位符语义）。
pub fn escape_path(value: &str, encode_sep: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for &b in value.as_bytes() {
        if is_unreserved(b) || (b == b'/' && !encode_sep) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// 路径规范化：折叠重复分隔符，尾部分隔符当且仅当清理前存在时保留
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let trailing = path.len() > 1 && path.ends_with('/');
    let mut out = String::with_capacity(path.len());
    if path.starts_with('/') {
        out.push('/');
    }
    let mut first = true;
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if !first {
            out.push('/');
        }
        out.push_str(seg);
        first = false;
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// 将查询键值对编码为 `k=v&k=v` 形式
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (k, v) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&escape_path(k, true));
        out.push('=');
        out.push_str(&escape_path(v, true));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_path_encodes_separator() {
        assert_eq!(escape_path("a b/c", true), "a%20b%2Fc");
    }

    #[test]
    fn test_escape_path_preserves_separator() {
        assert_eq!(escape_path("a b/c", false), "a%20b/c");
    }

    #[test]
    fn test_escape_uppercase_hex() {
        assert_eq!(escape_path("ä", true), "%C3%A4");
        assert_eq!(escape_path("~-._", true), "~-._");
    }

    #[test]
    fn test_clean_path_collapses_duplicates() {
        assert_eq!(clean_path("/a//b///c"), "/a/b/c");
    }

    #[test]
    fn test_clean_path_preserves_trailing_separator() {
        assert_eq!(clean_path("/a//b/"), "/a/b/");
        assert_eq!(clean_path("/a/b"), "/a/b");
        assert_eq!(clean_path("/"), "/");
    }

    #[test]
    fn test_encode_query() {
        let pairs = vec![
            ("k".to_string(), "v 1".to_string()),
            ("x".to_string(), "y".to_string()),
        ];
        assert_eq!(encode_query(&pairs), "k=v%201&x=y");
    }
}

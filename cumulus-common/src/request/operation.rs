use reqwest::Method;

/// 远程调用的操作描述符
///
/// 路径模板可含 `{name}` / `{name+}` 占位符，由绑定器在 Build 阶段替换；
/// `{name+}` 变体在替换时保留值内的 `/`。
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    /// true 时仅拼接 `host + path`，跳过 service id 与 API 版本前缀
    pub path_as_is: bool,
}

impl Operation {
    pub fn new(name: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            path_as_is: false,
        }
    }

    pub fn path_as_is(mut self) -> Self {
        self.path_as_is = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_defaults() {
        let op = Operation::new("GetSubaccount", Method::GET, "/subaccounts/{subaccountGUID}");
        assert_eq!(op.name, "GetSubaccount");
        assert!(!op.path_as_is);
        assert!(Operation::new("X", Method::GET, "/x").path_as_is().path_as_is);
    }
}

/// 请求体和类型
///
/// 原生的 nil / reader / no-body 三态收敛为一个两臂和类型：
/// 请求体全量缓冲后重试回绕是平凡操作，每次尝试重发同一份字节。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// 无请求体；发送器不得发出 chunked 编码
    #[default]
    None,
    /// 全量缓冲的字节请求体
    Bytes(Vec<u8>),
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::None => 0,
            Body::Bytes(b) => b.len() as u64,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::None => None,
            Body::Bytes(b) => Some(b),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Body::None
        } else {
            Body::Bytes(bytes)
        }
    }
}

use std::collections::HashMap;

use crate::pipeline::HandlerList;
use crate::request::Request;

/// 请求生命周期中的阶段标识（封闭枚举，无法表示未知阶段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    Build,
    BuildStream,
    Sign,
    Send,
    ValidateResponse,
    Unmarshal,
    UnmarshalStream,
    UnmarshalMeta,
    UnmarshalError,
    Retry,
    AfterRetry,
    CompleteAttempt,
    Complete,
}

/// 阶段索引的处理器注册表
///
/// 每个阶段的列表在首次访问时惰性创建；未注册的阶段读取为空。
/// `copy` 产生独立的注册表：两侧后续的编辑互不影响，处理器槽位共享。
#[derive(Clone, Default)]
pub struct Handlers {
    stages: HashMap<Stage, HandlerList>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取某阶段的可变列表，不存在时惰性创建
    pub fn using(&mut self, stage: Stage) -> &mut HandlerList {
        self.stages.entry(stage).or_default()
    }

    pub fn get(&self, stage: Stage) -> Option<&HandlerList> {
        self.stages.get(&stage)
    }

    /// 独立副本（列表深拷贝、处理器共享）
    pub fn copy(&self) -> Handlers {
        self.clone()
    }

    /// 执行某一阶段；未注册的阶段为空操作
    pub async fn run(&self, stage: Stage, req: &mut Request<'_>) {
        if let Some(list) = self.stages.get(&stage) {
            list.exec(req).await;
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (stage, list) in &self.stages {
            map.entry(stage, &list.names());
        }
        map.finish()
    }
}

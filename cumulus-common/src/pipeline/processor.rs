use std::sync::Arc;

use async_trait::async_trait;

use crate::request::Request;

/// 处理器行为接口
///
/// 处理器对当前 [`Request`] 做一次变换，可以修改其任意字段（包括错误槽）。
/// 失败通过 `req.set_error` 体现，不使用返回值。
#[async_trait]
pub trait Handle: Send + Sync {
    async fn handle(&self, req: &mut Request<'_>);
}

/// 同步函数指针处理器的适配器
pub struct FnHandle(pub fn(&mut Request<'_>));

#[async_trait]
impl Handle for FnHandle {
    async fn handle(&self, req: &mut Request<'_>) {
        (self.0)(req)
    }
}

/// 命名处理器
///
/// 名称仅作标识，不要求全局唯一；`swap_named` 等按名编辑操作
/// 依赖它定位列表中的槽位。
#[derive(Clone)]
pub struct Processor {
    name: String,
    handler: Arc<dyn Handle>,
}

impl Processor {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Handle>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// 由同步函数指针构造处理器
    pub fn from_fn(name: impl Into<String>, f: fn(&mut Request<'_>)) -> Self {
        Self::new(name, Arc::new(FnHandle(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, req: &mut Request<'_>) {
        self.handler.handle(req).await
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").field("name", &self.name).finish()
    }
}

/// 迭代中断谓词：每个处理器执行后被询问，返回 true 则停止迭代
pub type AfterEach = fn(&Request<'_>) -> bool;

/// 现成谓词：请求携带非空错误时中断
pub fn stop_on_error(req: &Request<'_>) -> bool {
    req.error().is_some()
}

/// 有序处理器列表
///
/// 迭代顺序等于插入顺序（受编辑操作影响）；空列表合法且为空操作。
/// `clone` 深拷贝顺序向量、浅拷贝处理器槽位（处理器构造后无状态）。
#[derive(Clone, Default)]
pub struct HandlerList {
    list: Vec<Processor>,
    pub after_each: Option<AfterEach>,
}

impl HandlerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// 追加到尾部
    pub fn push_back(&mut self, p: Processor) {
        self.list.push(p);
    }

    /// 插入到头部，其余处理器整体右移
    pub fn push_front(&mut self, p: Processor) {
        self.list.insert(0, p);
    }

    /// 以匿名名称 "-" 追加一个函数指针处理器
    pub fn push_back_fn(&mut self, f: fn(&mut Request<'_>)) {
        self.push_back(Processor::from_fn("-", f));
    }

    /// 以匿名名称 "-" 前插一个函数指针处理器
    pub fn push_front_fn(&mut self, f: fn(&mut Request<'_>)) {
        self.push_front(Processor::from_fn("-", f));
    }

    /// 删除所有同名处理器，空隙收拢、其余顺序保持
    pub fn remove_by_name(&mut self, name: &str) {
        self.list.retain(|p| p.name() != name);
    }

    /// 原位替换所有同名处理器，返回是否有任何命中
    pub fn swap_named(&mut self, p: Processor) -> bool {
        let mut swapped = false;
        for slot in &mut self.list {
            if slot.name() == p.name() {
                *slot = p.clone();
                swapped = true;
            }
        }
        swapped
    }

    /// 按名替换，未命中则前插
    pub fn set_front_named(&mut self, p: Processor) {
        if !self.swap_named(p.clone()) {
            self.push_front(p);
        }
    }

    /// 按名替换，未命中则追加
    pub fn set_back_named(&mut self, p: Processor) {
        if !self.swap_named(p.clone()) {
            self.push_back(p);
        }
    }

    /// 当前顺序下的处理器名称
    pub fn names(&self) -> Vec<&str> {
        self.list.iter().map(|p| p.name()).collect()
    }

    /// 依次执行处理器；每次执行后询问 `after_each`，true 则中断
    pub async fn exec(&self, req: &mut Request<'_>) {
        for p in &self.list {
            log::trace!("running processor '{}'", p.name());
            p.run(req).await;
            if let Some(pred) = self.after_each {
                if pred(req) {
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for HandlerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerList")
            .field("names", &self.names())
            .field("after_each", &self.after_each.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_req: &mut Request<'_>) {}

    fn named(name: &str) -> Processor {
        Processor::from_fn(name, noop)
    }

    #[test]
    fn test_push_ordering() {
        let mut list = HandlerList::new();
        list.push_back(named("a"));
        list.push_back(named("b"));
        list.push_front(named("c"));
        assert_eq!(list.names(), vec!["c", "a", "b"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_by_name_removes_all_matches() {
        let mut list = HandlerList::new();
        list.push_back(named("x"));
        list.push_back(named("y"));
        list.push_back(named("x"));
        list.push_back(named("z"));
        list.remove_by_name("x");
        assert_eq!(list.names(), vec!["y", "z"]);
    }

    #[test]
    fn test_swap_named_replaces_in_place() {
        let mut list = HandlerList::new();
        list.push_back(named("a"));
        list.push_back(named("b"));
        list.push_back(named("a"));

        assert!(list.swap_named(named("a")));
        assert_eq!(list.names(), vec!["a", "b", "a"]);

        assert!(!list.swap_named(named("missing")));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_set_named_replace_or_append() {
        let mut list = HandlerList::new();
        list.push_back(named("a"));

        list.set_back_named(named("a"));
        assert_eq!(list.names(), vec!["a"]);

        list.set_back_named(named("b"));
        assert_eq!(list.names(), vec!["a", "b"]);

        list.set_front_named(named("c"));
        assert_eq!(list.names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_anonymous_push_fn() {
        let mut list = HandlerList::new();
        list.push_back_fn(noop);
        list.push_front_fn(noop);
        assert_eq!(list.names(), vec!["-", "-"]);
    }

    #[test]
    fn test_copy_is_independent_ordering() {
        let mut list = HandlerList::new();
        list.push_back(named("a"));
        let mut copy = list.clone();
        copy.push_back(named("b"));
        copy.remove_by_name("a");

        assert_eq!(list.names(), vec!["a"]);
        assert_eq!(copy.names(), vec!["b"]);
    }

    #[test]
    fn test_clear() {
        let mut list = HandlerList::new();
        list.push_back(named("a"));
        list.clear();
        assert!(list.is_empty());
    }
}

//! 未完成的验证码请求表
//!
//! 请求 ID → 一次性回复通道。同一时间最多只有一个未完成的请求。
//! 登记之前就到达的回复会暂存，登记时立即交付

use crate::error::CaptchaError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

/// 暂存回复的上限，超出时丢弃最早的
const MAX_HELD: usize = 16;

#[derive(Default)]
struct Entries {
    pending: HashMap<String, oneshot::Sender<String>>,
    held: VecDeque<(String, String)>,
}

#[derive(Default)]
pub struct CaptchaRegistry {
    entries: Mutex<Entries>,
}

impl CaptchaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记新的请求，返回等待答案的接收端
    pub fn register(
        &self,
        request_id: impl Into<String>,
    ) -> Result<oneshot::Receiver<String>, CaptchaError> {
        let mut entries = self.lock();
        if let Some(existing) = entries.pending.keys().next() {
            return Err(CaptchaError::AlreadyPending {
                request_id: existing.clone(),
            });
        }

        let request_id = request_id.into();
        let (tx, rx) = oneshot::channel();

        if let Some(index) = entries.held.iter().position(|(id, _)| *id == request_id) {
            if let Some((_, solution)) = entries.held.remove(index) {
                debug!("验证码请求 {} 已有暂存答案", request_id);
                // 接收端就在本函数中返回，发送不会失败
                let _ = tx.send(solution);
                return Ok(rx);
            }
        }

        debug!("登记验证码请求: {}", request_id);
        entries.pending.insert(request_id, tx);
        Ok(rx)
    }

    /// 按请求 ID 提交答案，ID 不存在时返回 `false`
    pub fn resolve(&self, request_id: &str, solution: impl Into<String>) -> bool {
        let sender = self.lock().pending.remove(request_id);
        match sender {
            Some(tx) => tx.send(solution.into()).is_ok(),
            None => false,
        }
    }

    /// 请求已登记时直接交付；否则暂存，等同 ID 的请求登记时交付
    ///
    /// 返回是否立即交付
    pub fn resolve_or_hold(&self, request_id: &str, solution: impl Into<String>) -> bool {
        let solution = solution.into();
        let mut entries = self.lock();
        match entries.pending.remove(request_id) {
            Some(tx) => tx.send(solution).is_ok(),
            None => {
                entries.held.retain(|(id, _)| id != request_id);
                if entries.held.len() >= MAX_HELD {
                    entries.held.pop_front();
                }
                entries.held.push_back((request_id.to_string(), solution));
                false
            }
        }
    }

    /// 未指明请求 ID 时，答案交给当前唯一的未完成请求
    pub fn resolve_latest(&self, solution: impl Into<String>) -> bool {
        let sender = {
            let mut entries = self.lock();
            let key = entries.pending.keys().next().cloned();
            key.and_then(|k| entries.pending.remove(&k))
        };
        match sender {
            Some(tx) => tx.send(solution.into()).is_ok(),
            None => false,
        }
    }

    /// 取消请求，等待方会收到通道关闭
    pub fn cancel(&self, request_id: &str) -> bool {
        self.lock().pending.remove(request_id).is_some()
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.lock().pending.contains_key(request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

/// 离开作用域时撤销请求，避免等待方被中断后残留记录
pub(crate) struct PendingGuard<'a> {
    registry: &'a CaptchaRegistry,
    request_id: String,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn new(registry: &'a CaptchaRegistry, request_id: impl Into<String>) -> Self {
        Self {
            registry,
            request_id: request_id.into(),
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.registry.cancel(&self.request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_by_id() {
        let registry = CaptchaRegistry::new();
        let rx = registry.register("msg-1").unwrap();

        assert!(registry.resolve("msg-1", "ab12"));
        assert_eq!(rx.await.unwrap(), "ab12");
        assert_eq!(registry.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_latest_without_id() {
        let registry = CaptchaRegistry::new();
        let rx = registry.register("msg-2").unwrap();

        assert!(registry.resolve_latest("xyz"));
        assert_eq!(rx.await.unwrap(), "xyz");
        assert!(!registry.resolve_latest("again"));
    }

    #[test]
    fn test_second_request_rejected() {
        let registry = CaptchaRegistry::new();
        let _rx = registry.register("msg-1").unwrap();

        let err = tokio_test::assert_err!(registry.register("msg-2"));
        assert!(matches!(
            err,
            CaptchaError::AlreadyPending { request_id } if request_id == "msg-1"
        ));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let registry = CaptchaRegistry::new();
        let _rx = registry.register("msg-1").unwrap();

        assert!(!registry.resolve("other", "abc"));
        assert!(registry.is_pending("msg-1"));
    }

    #[tokio::test]
    async fn test_cancel_closes_receiver() {
        let registry = CaptchaRegistry::new();
        let rx = registry.register("msg-1").unwrap();

        assert!(registry.cancel("msg-1"));
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_early_reply_delivered_on_register() {
        let registry = CaptchaRegistry::new();

        assert!(!registry.resolve_or_hold("msg-7", "early"));
        let rx = registry.register("msg-7").unwrap();

        assert_eq!(rx.await.unwrap(), "early");
        assert_eq!(registry.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_held_reply_for_other_id_is_not_used() {
        let registry = CaptchaRegistry::new();
        registry.resolve_or_hold("msg-1", "stale");

        let rx = registry.register("msg-2").unwrap();
        assert!(registry.is_pending("msg-2"));
        assert!(registry.resolve_or_hold("msg-2", "fresh"));
        assert_eq!(rx.await.unwrap(), "fresh");
    }

    #[test]
    fn test_guard_cleans_up() {
        let registry = CaptchaRegistry::new();
        let _rx = registry.register("msg-1").unwrap();
        {
            let _guard = PendingGuard::new(&registry, "msg-1");
        }
        assert_eq!(registry.pending_count(), 0);
        tokio_test::assert_ok!(registry.register("msg-2"));
    }
}

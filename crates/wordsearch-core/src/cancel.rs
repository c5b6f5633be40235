//! 协作式取消
//!
//! `CancellationToken` 交给扫描流程（文件之间、行之间检查），
//! `CancellationHandle` 留在调用方用于触发取消。
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 扫描流程持有的取消令牌
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

/// 调用方持有的取消句柄
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    flag: Arc<AtomicBool>,
}

/// 创建一对 (token, handle)
pub fn cancellation_pair() -> (CancellationToken, CancellationHandle) {
    let flag = Arc::new(AtomicBool::new(false));
    (CancellationToken { flag: Arc::clone(&flag) }, CancellationHandle { flag })
}

impl CancellationToken {
    /// 永不取消的令牌
    pub fn never() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl CancellationHandle {
    /// 幂等
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_cancels_every_token_clone() {
        let (token, handle) = cancellation_pair();
        let other = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
        assert!(!CancellationToken::never().is_cancelled());
    }
}

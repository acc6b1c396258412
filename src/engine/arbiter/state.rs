//! ### English
//! Plain-data arbitration state. Always accessed under the shared monitor.
//!
//! ### 中文
//! 纯数据形式的仲裁状态。始终在共享监视器内访问。

use std::sync::Arc;

use log::debug;

use super::LoopId;
use super::probe::CapabilityProbe;

/// ### English
/// Platform API level from which multiple concurrent contexts are always allowed (2.0).
///
/// ### 中文
/// 从该平台 API 级别（2.0）起始终允许多个并发上下文。
pub(crate) const MULTI_CONTEXT_API_VERSION: u32 = 0x20000;

/// ### English
/// Renderer prefix of a driver family that only supports a limited number of contexts.
///
/// ### 中文
/// 只支持有限个上下文的驱动系列的渲染器前缀。
pub(crate) const LIMITED_RENDERER_PREFIX: &str = "Q3Dimension MSM7500 ";

/// ### English
/// Outcome of one non-blocking acquisition attempt.
///
/// ### 中文
/// 一次非阻塞获取尝试的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// ### English
    /// The requester now holds the exclusive token.
    ///
    /// ### 中文
    /// 请求方现在持有独占令牌。
    Granted,
    /// ### English
    /// Contexts may coexist; the requester proceeds without the token.
    ///
    /// ### 中文
    /// 上下文可以共存；请求方无需令牌即可继续。
    Shared,
    /// ### English
    /// Someone else holds the token; `owner` must be asked to release it.
    ///
    /// ### 中文
    /// 令牌被他人持有；需要请求 `owner` 释放。
    Denied { owner: LoopId },
}

/// ### English
/// Snapshot of the cached capability flags.
///
/// ### 中文
/// 已缓存能力标志的快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub version_check_done: bool,
    pub driver_check_done: bool,
    pub api_version: u32,
    pub multiple_contexts_allowed: bool,
    pub limited_contexts: bool,
}

pub(crate) struct ArbiterState {
    probe: Arc<dyn CapabilityProbe>,
    owner: Option<LoopId>,
    caps: Capabilities,
}

impl ArbiterState {
    pub(crate) fn new(probe: Arc<dyn CapabilityProbe>) -> Self {
        Self {
            probe,
            owner: None,
            caps: Capabilities::default(),
        }
    }

    pub(crate) fn owner(&self) -> Option<LoopId> {
        self.owner
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// ### English
    /// Tries once to take the context token. Never blocks.
    ///
    /// There is no fairness: an owner that keeps drawing reacquires on every iteration.
    ///
    /// ### 中文
    /// 尝试一次获取上下文令牌，从不阻塞。
    ///
    /// 没有公平性：持续绘制的持有者每次迭代都会重新获取。
    pub(crate) fn try_acquire(&mut self, requester: LoopId) -> Acquire {
        match self.owner {
            None => {
                self.owner = Some(requester);
                Acquire::Granted
            }
            Some(owner) if owner == requester => Acquire::Granted,
            Some(owner) => {
                self.check_version();
                if self.caps.multiple_contexts_allowed {
                    Acquire::Shared
                } else {
                    Acquire::Denied { owner }
                }
            }
        }
    }

    /// ### English
    /// Clears the owner if it is `requester`. Returns whether anything changed.
    ///
    /// ### 中文
    /// 若持有者为 `requester` 则清除。返回是否发生了变化。
    pub(crate) fn release(&mut self, requester: LoopId) -> bool {
        if self.owner == Some(requester) {
            self.owner = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn should_release_on_pause(&self) -> bool {
        self.caps.limited_contexts
    }

    pub(crate) fn should_terminate_on_pause(&mut self) -> bool {
        self.check_version();
        !self.caps.multiple_contexts_allowed
    }

    /// ### English
    /// One-time driver check. `probe` defaults to the arbiter's own probe.
    ///
    /// Returns `true` only on the call that performed the check.
    ///
    /// ### 中文
    /// 一次性驱动检查。`probe` 缺省时使用仲裁器自身的探测器。
    ///
    /// 只有真正执行检查的那次调用返回 `true`。
    pub(crate) fn check_driver(&mut self, probe: Option<&dyn CapabilityProbe>) -> bool {
        if self.caps.driver_check_done {
            return false;
        }
        let renderer = match probe {
            Some(probe) => probe.renderer(),
            None => self.probe.renderer(),
        };

        self.check_version();
        if self.caps.api_version < MULTI_CONTEXT_API_VERSION {
            self.caps.multiple_contexts_allowed = !renderer
                .as_deref()
                .is_some_and(|renderer| renderer.starts_with(LIMITED_RENDERER_PREFIX));
        }
        self.caps.limited_contexts = !self.caps.multiple_contexts_allowed;
        self.caps.driver_check_done = true;
        debug!(
            "driver check: renderer={renderer:?} multiple_contexts_allowed={} limited_contexts={}",
            self.caps.multiple_contexts_allowed, self.caps.limited_contexts
        );
        true
    }

    fn check_version(&mut self) {
        if self.caps.version_check_done {
            return;
        }
        self.caps.api_version = self.probe.api_version();
        if self.caps.api_version >= MULTI_CONTEXT_API_VERSION
            || self.probe.multiple_contexts_supported()
        {
            self.caps.multiple_contexts_allowed = true;
        }
        self.caps.version_check_done = true;
        debug!(
            "version check: api_version={:#x} multiple_contexts_allowed={}",
            self.caps.api_version, self.caps.multiple_contexts_allowed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arbiter::probe::StaticProbe;

    fn state(probe: StaticProbe) -> ArbiterState {
        ArbiterState::new(Arc::new(probe))
    }

    #[test]
    fn first_requester_takes_token() {
        let mut arbiter = state(StaticProbe::default());
        assert_eq!(arbiter.try_acquire(LoopId(1)), Acquire::Granted);
        assert_eq!(arbiter.owner(), Some(LoopId(1)));
        assert_eq!(arbiter.try_acquire(LoopId(1)), Acquire::Granted);
    }

    #[test]
    fn contended_token_names_owner() {
        let mut arbiter = state(StaticProbe::new(None, 0x10000, false));
        arbiter.try_acquire(LoopId(1));
        assert_eq!(
            arbiter.try_acquire(LoopId(2)),
            Acquire::Denied { owner: LoopId(1) }
        );
        assert_eq!(arbiter.owner(), Some(LoopId(1)));
    }

    #[test]
    fn multi_context_versions_share() {
        let mut arbiter = state(StaticProbe::new(None, 0x30000, false));
        arbiter.try_acquire(LoopId(1));
        assert_eq!(arbiter.try_acquire(LoopId(2)), Acquire::Shared);
        assert_eq!(arbiter.owner(), Some(LoopId(1)));

        let mut native = state(StaticProbe::new(None, 0, true));
        native.try_acquire(LoopId(1));
        assert_eq!(native.try_acquire(LoopId(2)), Acquire::Shared);
    }

    #[test]
    fn release_by_non_owner_is_noop() {
        let mut arbiter = state(StaticProbe::default());
        arbiter.try_acquire(LoopId(1));
        assert!(!arbiter.release(LoopId(2)));
        assert_eq!(arbiter.owner(), Some(LoopId(1)));
        assert!(arbiter.release(LoopId(1)));
        assert!(!arbiter.release(LoopId(1)));
        assert_eq!(arbiter.owner(), None);
    }

    #[test]
    fn limited_driver_detected_once() {
        let mut arbiter = state(StaticProbe::new(
            Some("Q3Dimension MSM7500 1.0"),
            0x10000,
            false,
        ));
        assert!(!arbiter.should_release_on_pause());
        assert!(arbiter.check_driver(None));
        assert!(arbiter.should_release_on_pause());
        assert!(arbiter.should_terminate_on_pause());

        let other = StaticProbe::new(Some("Fast GPU"), 0x10000, false);
        assert!(!arbiter.check_driver(Some(&other)));
        assert!(arbiter.capabilities().limited_contexts);
    }

    #[test]
    fn unknown_old_driver_allows_multiple_after_check() {
        let mut arbiter = state(StaticProbe::new(Some("Generic"), 0x10000, false));
        assert!(arbiter.should_terminate_on_pause());
        arbiter.check_driver(None);
        let caps = arbiter.capabilities();
        assert!(caps.driver_check_done);
        assert!(caps.multiple_contexts_allowed);
        assert!(!caps.limited_contexts);
        assert!(!arbiter.should_terminate_on_pause());
    }

    #[test]
    fn modern_version_ignores_renderer() {
        let mut arbiter = state(StaticProbe::new(
            Some("Q3Dimension MSM7500 1.0"),
            0x20000,
            false,
        ));
        arbiter.check_driver(None);
        let caps = arbiter.capabilities();
        assert!(caps.multiple_contexts_allowed);
        assert!(!caps.limited_contexts);
    }
}

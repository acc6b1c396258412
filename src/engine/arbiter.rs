//! ### English
//! Context arbiter: the single monitor shared by a set of render loops, plus the exclusive
//! "may hold a rendering context" token they compete for.
//!
//! Every loop registers its state here, so arbitration, lifecycle requests and the render
//! threads all synchronize through one mutex and one condition variable. There is no lock
//! ordering to get wrong.
//!
//! ### 中文
//! 上下文仲裁器：一组渲染循环共享的唯一监视器，以及它们竞争的“可持有渲染上下文”独占令牌。
//!
//! 每个循环都在此登记自己的状态，因此仲裁、生命周期请求与渲染线程都通过同一个互斥锁和
//! 同一个条件变量同步，不存在加锁顺序问题。

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};

use crate::engine::runtime::LoopState;

mod probe;
mod state;

pub use probe::{CapabilityProbe, StaticProbe};
pub use state::Capabilities;

pub(crate) use state::{Acquire, ArbiterState};

/// ### English
/// Identifier of one render loop registered with an arbiter.
///
/// The arbiter only ever stores ids, never loops, so it cannot keep a loop alive.
///
/// ### 中文
/// 在仲裁器中登记的单个渲染循环的标识。
///
/// 仲裁器只保存 id 而不保存循环本身，因此不会延长循环的生命周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(pub(crate) u32);

impl LoopId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ### English
/// Everything guarded by the monitor.
///
/// ### 中文
/// 受监视器保护的全部数据。
pub(crate) struct Shared {
    pub(crate) arbiter: ArbiterState,
    pub(crate) loops: HashMap<LoopId, LoopState>,
}

impl Shared {
    pub(crate) fn loop_state(&self, id: LoopId) -> Option<&LoopState> {
        self.loops.get(&id)
    }

    pub(crate) fn loop_state_mut(&mut self, id: LoopId) -> Option<&mut LoopState> {
        self.loops.get_mut(&id)
    }

    /// ### English
    /// Fire-and-forget request from `requester` asking `owner` to give up its context on its
    /// next iteration.
    ///
    /// ### 中文
    /// 来自 `requester` 的发后即忘请求：让 `owner` 在下一次迭代中放弃其上下文。
    pub(crate) fn request_release(&mut self, owner: LoopId, requester: LoopId) {
        if let Some(state) = self.loop_state_mut(owner) {
            state.should_release_context = true;
            state.release_requested_by = Some(requester);
        }
    }

    /// ### English
    /// Drops a pending release request on `id` whose requester no longer wants a context
    /// (exited, deregistered, paused, or already holding one). Returns `true` when a
    /// request was dropped.
    ///
    /// ### 中文
    /// 若向 `id` 发出释放请求的循环已不再需要上下文（已退出、已注销、已暂停或已持有），
    /// 则撤销该请求。撤销时返回 `true`。
    pub(crate) fn withdraw_stale_release(&mut self, id: LoopId) -> bool {
        let requester = match self.loop_state(id) {
            Some(state) if state.should_release_context => state.release_requested_by,
            _ => return false,
        };
        let live = requester
            .and_then(|requester| self.loop_state(requester))
            .is_some_and(LoopState::wants_context);
        if live {
            return false;
        }
        if let Some(state) = self.loop_state_mut(id) {
            state.should_release_context = false;
            state.release_requested_by = None;
        }
        debug!("render loop {id}: dropping stale release request from {requester:?}");
        true
    }
}

/// ### English
/// Shared context arbiter. Construct one per group of loops that compete for contexts and
/// hand the same `Arc` to each [`crate::SurfaceController`].
///
/// ### 中文
/// 共享的上下文仲裁器。为每组竞争上下文的循环构造一个，并把同一个 `Arc` 交给每个
/// [`crate::SurfaceController`]。
pub struct ContextArbiter {
    /// ### English
    /// Arbitration state and the registered loop states.
    ///
    /// ### 中文
    /// 仲裁状态与已登记的循环状态。
    shared: Mutex<Shared>,
    /// ### English
    /// The only condition variable: every state change notifies all waiters here.
    ///
    /// ### 中文
    /// 唯一的条件变量：任何状态变化都会在这里通知所有等待者。
    cond: Condvar,
    /// ### English
    /// Monotonic loop id generator.
    ///
    /// ### 中文
    /// 单调递增的循环 id 生成器。
    next_id: AtomicU32,
}

impl ContextArbiter {
    /// ### English
    /// Creates an arbiter whose capability checks consult `probe`.
    ///
    /// ### 中文
    /// 创建一个仲裁器，其能力检查通过 `probe` 查询。
    pub fn new(probe: Arc<dyn CapabilityProbe>) -> Arc<Self> {
        Arc::new(Self {
            shared: Mutex::new(Shared {
                arbiter: ArbiterState::new(probe),
                loops: HashMap::new(),
            }),
            cond: Condvar::new(),
            next_id: AtomicU32::new(1),
        })
    }

    /// ### English
    /// Non-blocking token acquisition on behalf of `requester`.
    ///
    /// Returns `true` when the requester may hold a context, either as owner or because
    /// contexts can coexist. On `false` the current owner has been asked to release.
    ///
    /// ### 中文
    /// 代表 `requester` 以非阻塞方式获取令牌。
    ///
    /// 当请求方可以持有上下文（作为持有者，或因上下文可共存）时返回 `true`。
    /// 返回 `false` 时，已请求当前持有者释放。
    pub fn try_acquire(&self, requester: LoopId) -> bool {
        let mut guard = self.lock();
        let granted = match guard.arbiter.try_acquire(requester) {
            Acquire::Granted | Acquire::Shared => true,
            Acquire::Denied { owner } => {
                guard.request_release(owner, requester);
                false
            }
        };
        drop(guard);
        self.notify_all();
        granted
    }

    /// ### English
    /// Releases the token if `requester` holds it. Idempotent.
    ///
    /// ### 中文
    /// 若 `requester` 持有令牌则释放。幂等。
    pub fn release(&self, requester: LoopId) {
        let released = self.lock().arbiter.release(requester);
        if released {
            self.notify_all();
        }
    }

    pub fn should_release_on_pause(&self) -> bool {
        self.lock().arbiter.should_release_on_pause()
    }

    pub fn should_terminate_on_pause(&self) -> bool {
        self.lock().arbiter.should_terminate_on_pause()
    }

    /// ### English
    /// One-time driver check using `probe`'s renderer identifier. Later calls are no-ops.
    ///
    /// ### 中文
    /// 使用 `probe` 的渲染器标识进行一次性驱动检查。之后的调用不做任何事。
    pub fn check_driver(&self, probe: &dyn CapabilityProbe) {
        self.check_driver_with(Some(probe));
    }

    pub(crate) fn check_driver_with(&self, probe: Option<&dyn CapabilityProbe>) {
        let checked = self.lock().arbiter.check_driver(probe);
        if checked {
            self.notify_all();
        }
    }

    /// ### English
    /// Current token owner, if any.
    ///
    /// ### 中文
    /// 当前令牌持有者（若有）。
    pub fn owner(&self) -> Option<LoopId> {
        self.lock().arbiter.owner()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.lock().arbiter.capabilities()
    }

    /// ### English
    /// Number of loops currently registered.
    ///
    /// ### 中文
    /// 当前已登记的循环数量。
    pub fn loop_count(&self) -> usize {
        self.lock().loops.len()
    }

    pub(crate) fn register(&self, state: LoopState) -> LoopId {
        let id = LoopId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().loops.insert(id, state);
        trace!("registered render loop {id}");
        id
    }

    pub(crate) fn deregister(&self, id: LoopId) {
        let mut guard = self.lock();
        guard.loops.remove(&id);
        guard.arbiter.release(id);
        drop(guard);
        self.notify_all();
        trace!("deregistered render loop {id}");
    }

    /// ### English
    /// Locks the monitor. A poisoned monitor is recovered: the protocol re-checks every
    /// predicate after re-acquiring, so continuing is safe.
    ///
    /// ### 中文
    /// 锁定监视器。被 poison 的监视器会被恢复：协议在重新获取锁后会重新检查所有谓词，
    /// 因此继续执行是安全的。
    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| {
            warn!("context arbiter monitor poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn wait<'a>(&self, guard: MutexGuard<'a, Shared>) -> MutexGuard<'a, Shared> {
        self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }
}

impl fmt::Debug for ContextArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        f.debug_struct("ContextArbiter")
            .field("owner", &guard.arbiter.owner())
            .field("capabilities", &guard.arbiter.capabilities())
            .field("loops", &guard.loops.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runtime::LoopConfig;

    #[test]
    fn denied_acquire_posts_release_to_owner() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::new(None, 0x10000, false)));
        let first = arbiter.register(LoopState::new(&LoopConfig::default()));
        let second = arbiter.register(LoopState::new(&LoopConfig::default()));

        assert!(arbiter.try_acquire(first));
        assert!(!arbiter.try_acquire(second));
        assert_eq!(arbiter.owner(), Some(first));
        assert!(arbiter.lock().loop_state(first).unwrap().should_release_context);
        assert!(!arbiter.lock().loop_state(second).unwrap().should_release_context);
        assert_eq!(
            arbiter.lock().loop_state(first).unwrap().release_requested_by,
            Some(second)
        );

        arbiter.release(second);
        assert_eq!(arbiter.owner(), Some(first));
        arbiter.release(first);
        assert_eq!(arbiter.owner(), None);
        assert!(arbiter.try_acquire(second));
    }

    fn drawable(arbiter: &ContextArbiter) -> LoopId {
        let mut state = LoopState::new(&LoopConfig::default().with_initial_size(8, 8));
        state.has_surface = true;
        arbiter.register(state)
    }

    #[test]
    fn release_request_from_live_requester_stands() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::new(None, 0x10000, false)));
        let owner = drawable(&arbiter);
        let requester = drawable(&arbiter);
        assert!(arbiter.try_acquire(owner));
        arbiter.lock().loop_state_mut(owner).unwrap().have_context = true;
        assert!(!arbiter.try_acquire(requester));

        let mut guard = arbiter.lock();
        assert!(!guard.withdraw_stale_release(owner));
        assert!(guard.loop_state(owner).unwrap().should_release_context);
    }

    #[test]
    fn release_request_from_exited_requester_is_dropped() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::new(None, 0x10000, false)));
        let owner = drawable(&arbiter);
        let requester = drawable(&arbiter);
        assert!(arbiter.try_acquire(owner));
        assert!(!arbiter.try_acquire(requester));

        let mut guard = arbiter.lock();
        guard.loop_state_mut(requester).unwrap().exited = true;
        assert!(guard.withdraw_stale_release(owner));
        let state = guard.loop_state(owner).unwrap();
        assert!(!state.should_release_context);
        assert_eq!(state.release_requested_by, None);
        assert!(!guard.withdraw_stale_release(owner));
    }

    #[test]
    fn release_request_from_deregistered_requester_is_dropped() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::new(None, 0x10000, false)));
        let owner = drawable(&arbiter);
        let requester = drawable(&arbiter);
        assert!(arbiter.try_acquire(owner));
        assert!(!arbiter.try_acquire(requester));
        arbiter.deregister(requester);

        let mut guard = arbiter.lock();
        assert!(guard.withdraw_stale_release(owner));
        assert!(!guard.loop_state(owner).unwrap().should_release_context);
    }

    #[test]
    fn deregister_drops_ownership() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::default()));
        let id = arbiter.register(LoopState::new(&LoopConfig::default()));
        assert!(arbiter.try_acquire(id));
        assert_eq!(arbiter.loop_count(), 1);
        arbiter.deregister(id);
        assert_eq!(arbiter.owner(), None);
        assert_eq!(arbiter.loop_count(), 0);
    }

    #[test]
    fn public_driver_check_runs_once() {
        let arbiter = ContextArbiter::new(Arc::new(StaticProbe::new(None, 0x10000, false)));
        arbiter.check_driver(&StaticProbe::new(Some("Q3Dimension MSM7500 x"), 0, false));
        assert!(arbiter.should_release_on_pause());
        arbiter.check_driver(&StaticProbe::new(Some("Other"), 0, false));
        assert!(arbiter.capabilities().limited_contexts);
    }
}

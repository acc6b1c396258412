//! ### English
//! Owner-facing façade for one render loop.
//!
//! Every operation mutates the loop's state under the arbiter monitor, notifies all
//! waiters, and (for the blocking ones) waits on the same condition variable until the
//! render thread has acknowledged the change.
//!
//! ### 中文
//! 面向所有者的单个渲染循环门面。
//!
//! 每个操作都在仲裁器监视器内修改循环状态、通知所有等待者，
//! 并且（对阻塞操作而言）在同一个条件变量上等待，直到渲染线程确认了该变化。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use dpi::PhysicalSize;
use log::{debug, warn};

use crate::engine::arbiter::{ContextArbiter, LoopId, Shared};
use crate::engine::error::{BackendError, ControlError};
use crate::engine::rendering::GraphicsBackend;

use super::callback::{CallbackSlot, RenderCallback};
use super::config::LoopConfig;
use super::machine::{self, Phase};
use super::render_loop::RenderLoop;
use super::state::{LoopState, RenderMode};

/// ### English
/// Handle to one render loop and its dedicated thread.
///
/// Blocking operations must not be called from the render thread itself (that is, from
/// inside a [`RenderCallback`] method or a queued callable); they return
/// [`ControlError::OnRenderThread`] there instead of deadlocking.
///
/// Dropping the controller stops the thread and joins it.
///
/// ### 中文
/// 单个渲染循环及其专属线程的句柄。
///
/// 阻塞操作不得在渲染线程本身（即 [`RenderCallback`] 方法或排队的可调用对象内部）调用；
/// 在那里调用会返回 [`ControlError::OnRenderThread`]，而不是死锁。
///
/// 释放控制器会停止线程并 join。
pub struct SurfaceController {
    id: LoopId,
    arbiter: Arc<ContextArbiter>,
    callback: Arc<CallbackSlot>,
    /// ### English
    /// Join handle of the render thread; taken by the first successful exit.
    ///
    /// ### 中文
    /// 渲染线程的 join handle；由第一次成功的退出取走。
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl SurfaceController {
    /// ### English
    /// Registers a new loop with `arbiter` and starts its render thread.
    ///
    /// #### Parameters
    /// - `arbiter`: Shared arbiter; loops that compete for contexts must share one.
    /// - `callback`: Host drawing code, moved onto the render thread.
    /// - `backend`: Context/surface factory, moved onto the render thread.
    /// - `config`: Initial render mode, size, and thread settings.
    ///
    /// ### 中文
    /// 在 `arbiter` 中登记一个新循环并启动其渲染线程。
    ///
    /// #### 参数
    /// - `arbiter`：共享仲裁器；竞争上下文的循环必须共用同一个。
    /// - `callback`：宿主绘制代码，会被移交到渲染线程。
    /// - `backend`：上下文/表面工厂，会被移交到渲染线程。
    /// - `config`：初始渲染模式、尺寸与线程设置。
    pub fn new<C, B>(
        arbiter: Arc<ContextArbiter>,
        callback: C,
        backend: B,
        config: LoopConfig,
    ) -> Result<Self, ControlError>
    where
        C: RenderCallback,
        B: GraphicsBackend + 'static,
    {
        let id = arbiter.register(LoopState::new(&config));
        let callback = Arc::new(CallbackSlot::new(Box::new(callback)));
        let name = config
            .thread_name
            .clone()
            .unwrap_or_else(|| format!("RenderLoop {id}"));

        let render_loop = RenderLoop::new(
            id,
            arbiter.clone(),
            callback.clone(),
            backend,
            config.log_frames,
        );

        let thread = match thread::Builder::new()
            .name(name)
            .spawn(move || render_loop.run())
        {
            Ok(thread) => thread,
            Err(err) => {
                arbiter.deregister(id);
                return Err(err.into());
            }
        };
        debug!("render loop {id}: spawned with {config:?}");

        Ok(Self {
            id,
            arbiter,
            callback,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    /// ### English
    /// The host surface now exists. Blocks until the render thread has noticed it.
    ///
    /// ### 中文
    /// 宿主表面已存在。阻塞直到渲染线程察觉到它。
    pub fn surface_created(&self) -> Result<(), ControlError> {
        let mut guard = self.lock_off_render_thread("surface_created")?;
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.has_surface = true;
            state.finished_creating_surface = false;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| {
            state.waiting_for_surface && !state.finished_creating_surface && !state.exited
        });
        Ok(())
    }

    /// ### English
    /// The host surface is going away. Blocks until the render thread has released
    /// everything that depends on it. Idempotent.
    ///
    /// ### 中文
    /// 宿主表面即将消失。阻塞直到渲染线程释放所有依赖它的资源。幂等。
    pub fn surface_destroyed(&self) -> Result<(), ControlError> {
        let mut guard = self.lock_off_render_thread("surface_destroyed")?;
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.has_surface = false;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| !state.waiting_for_surface && !state.exited);
        Ok(())
    }

    /// ### English
    /// Asks for one frame without waiting for it. Safe from any thread.
    ///
    /// ### 中文
    /// 请求一帧但不等待。可在任意线程调用。
    pub fn request_render(&self) {
        let mut guard = self.arbiter.lock();
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.request_render = true;
        }
        drop(guard);
        self.arbiter.notify_all();
    }

    /// ### English
    /// Asks for one frame and waits until it completed or can no longer be produced.
    /// Returns immediately on the render thread.
    ///
    /// ### 中文
    /// 请求一帧并等待其完成或确定无法产出。在渲染线程上会立即返回。
    pub fn request_render_and_wait(&self) {
        let mut guard = self.arbiter.lock();
        let Some(state) = guard.loop_state_mut(self.id) else {
            return;
        };
        if state.is_render_thread() {
            return;
        }
        state.want_render_notification = true;
        state.request_render = true;
        state.render_complete = false;
        self.arbiter.notify_all();
        self.wait_while(guard, |state| {
            !state.exited && !state.paused && !state.render_complete && state.able_to_draw()
        });
    }

    /// ### English
    /// Pauses rendering. Returns once the pause hook has run and resources are released.
    ///
    /// ### 中文
    /// 暂停渲染。在暂停回调执行完毕且资源释放之后返回。
    pub fn on_pause(&self) -> Result<(), ControlError> {
        let mut guard = self.lock_off_render_thread("on_pause")?;
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.request_paused = true;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| !state.exited && !state.paused);
        Ok(())
    }

    /// ### English
    /// Resumes rendering. Returns once a frame has been produced, or once no frame can be
    /// produced (no surface, zero size, bad surface, exited).
    ///
    /// ### 中文
    /// 恢复渲染。在产出一帧之后返回；若无法产出帧（无表面、零尺寸、表面损坏、已退出）
    /// 也会返回。
    pub fn on_resume(&self) -> Result<(), ControlError> {
        let mut guard = self.lock_off_render_thread("on_resume")?;
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.request_paused = false;
            state.request_render = true;
            state.render_complete = false;
            state.want_render_notification = true;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| {
            !state.exited
                && (state.paused || (!state.render_complete && state.can_produce_frame()))
        });
        Ok(())
    }

    /// ### English
    /// Records a new surface size and waits for a frame at that size. On the render thread
    /// the size is recorded and the call returns immediately.
    ///
    /// ### 中文
    /// 记录新的表面尺寸并等待该尺寸下的一帧。在渲染线程上只记录尺寸并立即返回。
    pub fn on_window_resize(&self, width: u32, height: u32) {
        let mut guard = self.arbiter.lock();
        let Some(state) = guard.loop_state_mut(self.id) else {
            return;
        };
        state.size = PhysicalSize::new(width, height);
        state.size_changed = true;
        state.request_render = true;
        state.render_complete = false;
        if state.is_render_thread() {
            return;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| {
            !state.exited && !state.paused && !state.render_complete && state.able_to_draw()
        });
    }

    /// ### English
    /// Stops the render thread and joins it. Calling it again is a no-op.
    ///
    /// ### 中文
    /// 停止渲染线程并 join。再次调用不做任何事。
    pub fn request_exit_and_wait(&self) -> Result<(), ControlError> {
        let mut guard = self.lock_off_render_thread("request_exit_and_wait")?;
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.should_exit = true;
        }
        self.arbiter.notify_all();
        self.wait_while(guard, |state| !state.exited);

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("render loop {}: render thread panicked during join", self.id);
            }
        }
        Ok(())
    }

    /// ### English
    /// Queues `callable` to run on the render thread before its next drawing decision.
    /// Callables run in submission order, even while paused or without a surface.
    ///
    /// ### 中文
    /// 将 `callable` 排队，在渲染线程下一次绘制决策之前执行。
    /// 可调用对象按提交顺序执行，即使处于暂停或没有表面时也会执行。
    pub fn queue_callable<F>(&self, callable: F) -> Result<(), ControlError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut guard = self.arbiter.lock();
        let state = guard
            .loop_state_mut(self.id)
            .ok_or(ControlError::Exited)?;
        if state.exited || !state.queue.try_push(Box::new(callable)) {
            return Err(ControlError::Exited);
        }
        drop(guard);
        self.arbiter.notify_all();
        Ok(())
    }

    pub fn set_render_mode(&self, mode: RenderMode) {
        let mut guard = self.arbiter.lock();
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.render_mode = mode;
        }
        drop(guard);
        self.arbiter.notify_all();
    }

    /// ### English
    /// Sets the render mode from a raw `RENDERMODE_*` value.
    ///
    /// ### 中文
    /// 使用原始 `RENDERMODE_*` 值设置渲染模式。
    pub fn set_render_mode_raw(&self, mode: i32) -> Result<(), ControlError> {
        self.set_render_mode(RenderMode::try_from(mode)?);
        Ok(())
    }

    pub fn render_mode(&self) -> RenderMode {
        self.read(|state| state.render_mode).unwrap_or_default()
    }

    /// ### English
    /// Takes effect on the next pause.
    ///
    /// ### 中文
    /// 在下一次暂停时生效。
    pub fn set_preserve_context_on_pause(&self, preserve: bool) {
        let mut guard = self.arbiter.lock();
        if let Some(state) = guard.loop_state_mut(self.id) {
            state.preserve_context_on_pause = preserve;
        }
        drop(guard);
        self.arbiter.notify_all();
    }

    pub fn preserve_context_on_pause(&self) -> bool {
        self.read(|state| state.preserve_context_on_pause)
            .unwrap_or(false)
    }

    /// ### English
    /// Detaches the callback and hands it back. Afterwards the loop skips every hook and
    /// treats draws as "nothing drawn". Not callable from the render thread.
    ///
    /// ### 中文
    /// 分离回调并将其交还。此后循环会跳过所有回调，并把绘制视为“未绘制”。
    /// 不能在渲染线程上调用。
    pub fn detach(&self) -> Result<Option<Box<dyn RenderCallback>>, ControlError> {
        drop(self.lock_off_render_thread("detach")?);
        let callback = self.callback.detach();
        if callback.is_some() {
            debug!("render loop {}: callback detached", self.id);
        }
        Ok(callback)
    }

    pub fn is_attached(&self) -> bool {
        self.callback.is_attached()
    }

    pub fn is_exited(&self) -> bool {
        self.read(|state| state.exited).unwrap_or(true)
    }

    /// ### English
    /// Why the render thread stopped, if it stopped on a fatal error.
    ///
    /// ### 中文
    /// 渲染线程因致命错误停止时的原因。
    pub fn failure(&self) -> Option<BackendError> {
        self.read(|state| state.failure.clone()).flatten()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.read(|state| state.size)
            .unwrap_or(PhysicalSize::new(0, 0))
    }

    /// ### English
    /// Lifecycle phase snapshot, for diagnostics.
    ///
    /// ### 中文
    /// 生命周期阶段快照，用于诊断。
    pub fn phase(&self) -> Phase {
        self.read(machine::phase).unwrap_or(Phase::Exited)
    }

    fn read<R>(&self, f: impl FnOnce(&LoopState) -> R) -> Option<R> {
        self.arbiter.lock().loop_state(self.id).map(f)
    }

    fn lock_off_render_thread(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, Shared>, ControlError> {
        let guard = self.arbiter.lock();
        if guard
            .loop_state(self.id)
            .is_some_and(LoopState::is_render_thread)
        {
            return Err(ControlError::OnRenderThread(operation));
        }
        Ok(guard)
    }

    /// ### English
    /// Predicate wait on the shared condition variable. A deregistered loop never blocks.
    ///
    /// ### 中文
    /// 在共享条件变量上的谓词等待。已注销的循环不会阻塞。
    fn wait_while(
        &self,
        mut guard: MutexGuard<'_, Shared>,
        mut blocked: impl FnMut(&LoopState) -> bool,
    ) {
        while guard.loop_state(self.id).is_some_and(&mut blocked) {
            guard = self.arbiter.wait(guard);
        }
    }
}

impl Drop for SurfaceController {
    fn drop(&mut self) {
        let mut guard = self.arbiter.lock();
        if let Some(state) = guard.loop_state_mut(self.id) {
            if state.is_render_thread() {
                // Cannot join ourselves; the thread deregisters itself on exit.
                state.should_exit = true;
                state.orphaned = true;
                drop(guard);
                self.arbiter.notify_all();
                return;
            }
        }
        drop(guard);

        if let Err(err) = self.request_exit_and_wait() {
            warn!("render loop {}: exit on drop failed: {err}", self.id);
        }
        self.arbiter.deregister(self.id);
    }
}

impl std::fmt::Debug for SurfaceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceController")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish()
    }
}

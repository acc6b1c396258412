//! ### English
//! Render thread driver.
//!
//! The thread alternates between two halves:
//! - under the arbiter monitor: evaluate the machine and apply its resource actions;
//! - outside it: run callables, pause/resume hooks, and the drawing phase.
//!
//! The only blocking wait is the condition wait taken when the machine says `Wait`.
//!
//! ### 中文
//! 渲染线程驱动层。
//!
//! 线程在两部分之间交替：
//! - 持有仲裁器监视器时：对状态机求值并执行其资源操作；
//! - 监视器之外：运行可调用对象、暂停/恢复回调以及绘制阶段。
//!
//! 唯一的阻塞等待是状态机返回 `Wait` 时的条件等待。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, MutexGuard};
use std::thread;

use log::{Level, debug, error, log, trace, warn};

use crate::engine::arbiter::{ContextArbiter, LoopId, Shared};
use crate::engine::error::BackendError;
use crate::engine::rendering::{GraphicsBackend, SwapResult};

use super::callback::CallbackSlot;
use super::machine::{self, Action, Hook, Locals, Next};

/// ### English
/// What the drawing phase reports back to the monitor-held half.
///
/// ### 中文
/// 绘制阶段回报给持锁部分的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameOutcome {
    SurfaceFailed,
    Finished {
        surface_created: bool,
        surface_is_bad: bool,
    },
}

pub(crate) struct RenderLoop<B: GraphicsBackend> {
    id: LoopId,
    arbiter: Arc<ContextArbiter>,
    callback: Arc<CallbackSlot>,
    backend: B,
    locals: Locals,
    frame_level: Level,
    frames: u64,
}

impl<B: GraphicsBackend> RenderLoop<B> {
    pub(crate) fn new(
        id: LoopId,
        arbiter: Arc<ContextArbiter>,
        callback: Arc<CallbackSlot>,
        backend: B,
        log_frames: bool,
    ) -> Self {
        Self {
            id,
            arbiter,
            callback,
            backend,
            locals: Locals::default(),
            frame_level: if log_frames {
                Level::Debug
            } else {
                Level::Trace
            },
            frames: 0,
        }
    }

    /// ### English
    /// Render thread entry. Returns only after `exited` has been published.
    ///
    /// ### 中文
    /// 渲染线程入口。只有在 `exited` 发布之后才返回。
    pub(crate) fn run(mut self) {
        let id = self.id;
        if let Some(state) = self.arbiter.lock().loop_state_mut(id) {
            state.thread = Some(thread::current().id());
        }
        debug!("render loop {id}: starting");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.callback.with(|callback| callback.on_start());
            self.guarded_run()
        }));

        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => {
                error!("render loop {id}: stopping on fatal error: {err}");
                Some(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("render loop {id}: render thread panicked: {message}");
                Some(BackendError::Backend(format!(
                    "render thread panicked: {message}"
                )))
            }
        };

        self.finish(failure);
        debug!("render loop {id}: exited after {} frames", self.frames);
    }

    fn guarded_run(&mut self) -> Result<(), BackendError> {
        let arbiter = self.arbiter.clone();
        let mut guard = arbiter.lock();

        loop {
            guard.withdraw_stale_release(self.id);
            let evaluation = {
                let Shared {
                    arbiter: arbitration,
                    loops,
                } = &mut *guard;
                let Some(state) = loops.get_mut(&self.id) else {
                    return Ok(());
                };
                machine::evaluate(self.id, state, &mut self.locals, arbitration)
            };

            self.apply(&mut guard, &evaluation.actions)?;
            if evaluation.notify {
                arbiter.notify_all();
            }

            match evaluation.next {
                Next::Exit => return Ok(()),
                Next::Wait => {
                    guard = arbiter.wait(guard);
                }
                Next::RunCallable(callable) => {
                    drop(guard);
                    callable();
                    guard = arbiter.lock();
                }
                Next::Hook(hook) => {
                    drop(guard);
                    self.deliver(hook);
                    self.locals.callback_paused = hook == Hook::Pause;
                    guard = arbiter.lock();
                }
                Next::Draw => {
                    drop(guard);
                    let outcome = self.draw_frame();
                    guard = arbiter.lock();
                    self.record(&mut guard, outcome);
                    arbiter.notify_all();
                }
            }
        }
    }

    /// ### English
    /// Executes resource actions while the monitor is held, so the token and the resource
    /// change together.
    ///
    /// ### 中文
    /// 在持有监视器时执行资源操作，使令牌与资源同步变化。
    fn apply(
        &mut self,
        guard: &mut MutexGuard<'_, Shared>,
        actions: &[Action],
    ) -> Result<(), BackendError> {
        for action in actions {
            match *action {
                Action::DestroySurface => {
                    debug!("render loop {}: destroying surface", self.id);
                    self.backend.destroy_surface();
                }
                Action::DestroyContext => {
                    debug!("render loop {}: destroying context", self.id);
                    self.backend.destroy_context();
                }
                Action::Terminate => {
                    debug!("render loop {}: terminating backend", self.id);
                    self.backend.terminate();
                }
                Action::CreateContext => {
                    debug!("render loop {}: creating context", self.id);
                    if let Err(err) = self.backend.create_context() {
                        guard.arbiter.release(self.id);
                        if let Some(state) = guard.loop_state_mut(self.id) {
                            state.have_context = false;
                            state.have_surface = false;
                        }
                        self.arbiter.notify_all();
                        return Err(err);
                    }
                }
                Action::RequestRelease(owner) => {
                    trace!("render loop {}: asking loop {owner} to release", self.id);
                    guard.request_release(owner, self.id);
                }
            }
        }
        Ok(())
    }

    fn deliver(&mut self, hook: Hook) {
        debug!("render loop {}: delivering {hook:?}", self.id);
        self.callback.with(|callback| match hook {
            Hook::Pause => callback.on_pause(),
            Hook::Resume => callback.on_resume(),
        });
    }

    /// ### English
    /// Drawing phase, entirely outside the monitor.
    ///
    /// ### 中文
    /// 绘制阶段，完全在监视器之外执行。
    fn draw_frame(&mut self) -> FrameOutcome {
        let id = self.id;
        let mut surface_created = false;

        if self.locals.create_surface {
            debug!("render loop {id}: creating surface");
            if !self.backend.create_surface() {
                warn!("render loop {id}: surface creation failed");
                return FrameOutcome::SurfaceFailed;
            }
            self.locals.create_surface = false;
            surface_created = true;
        }

        if self.locals.probe_driver {
            self.arbiter.check_driver_with(self.backend.probe());
            self.locals.probe_driver = false;
        }

        if self.locals.create_context {
            let config = self.backend.config();
            debug!("render loop {id}: on_surface_created {config:?}");
            self.callback
                .with(|callback| callback.on_surface_created(&config));
            self.locals.create_context = false;
        }

        if self.locals.size_changed {
            let size = self.locals.size;
            debug!(
                "render loop {id}: on_surface_changed {}x{}",
                size.width, size.height
            );
            self.callback
                .with(|callback| callback.on_surface_changed(size));
            self.locals.size_changed = false;
        }

        let drew = self
            .callback
            .with(|callback| callback.on_draw_frame())
            .unwrap_or(false);

        let mut surface_is_bad = false;
        if drew {
            self.frames += 1;
            log!(self.frame_level, "render loop {id}: frame {}", self.frames);
            match self.backend.swap_buffers() {
                SwapResult::Success => {}
                SwapResult::ContextLost => {
                    warn!("render loop {id}: context lost during swap");
                    self.locals.lost_context = true;
                }
                SwapResult::SurfaceError(code) => {
                    warn!("render loop {id}: swap failed with code {code:#x}");
                    surface_is_bad = true;
                }
            }
        }

        if self.locals.want_render_notification {
            self.locals.want_render_notification = false;
            self.locals.notify_pending = true;
        }

        FrameOutcome::Finished {
            surface_created,
            surface_is_bad,
        }
    }

    fn record(&self, guard: &mut MutexGuard<'_, Shared>, outcome: FrameOutcome) {
        let Some(state) = guard.loop_state_mut(self.id) else {
            return;
        };
        match outcome {
            FrameOutcome::SurfaceFailed => {
                state.finished_creating_surface = true;
                state.surface_is_bad = true;
            }
            FrameOutcome::Finished {
                surface_created,
                surface_is_bad,
            } => {
                if surface_created {
                    state.finished_creating_surface = true;
                }
                if surface_is_bad {
                    state.surface_is_bad = true;
                }
            }
        }
    }

    /// ### English
    /// Exit path shared by normal and fatal stops: tear down under the monitor, deliver
    /// `on_exit`, then publish `exited`.
    ///
    /// ### 中文
    /// 正常退出与致命停止共用的退出路径：在监视器内销毁资源，递送 `on_exit`，
    /// 然后发布 `exited`。
    fn finish(&mut self, failure: Option<BackendError>) {
        let id = self.id;
        let arbiter = self.arbiter.clone();

        {
            let mut guard = arbiter.lock();
            let Shared {
                arbiter: arbitration,
                loops,
            } = &mut *guard;
            if let Some(state) = loops.get_mut(&id) {
                if state.have_surface {
                    state.have_surface = false;
                    self.backend.destroy_surface();
                }
                if state.have_context {
                    state.have_context = false;
                    self.backend.destroy_context();
                }
            }
            arbitration.release(id);
        }
        arbiter.notify_all();

        let on_exit = panic::catch_unwind(AssertUnwindSafe(|| {
            self.callback.with(|callback| callback.on_exit());
        }));
        if let Err(payload) = on_exit {
            error!(
                "render loop {id}: on_exit panicked: {}",
                panic_message(payload.as_ref())
            );
        }

        let mut guard = arbiter.lock();
        let orphaned = match guard.loop_state_mut(id) {
            Some(state) => {
                state.exited = true;
                if state.failure.is_none() {
                    state.failure = failure;
                }
                let dropped = state.queue.close();
                if dropped > 0 {
                    debug!("render loop {id}: dropped {dropped} queued callables");
                }
                state.orphaned
            }
            None => false,
        };
        drop(guard);
        arbiter.notify_all();

        if orphaned {
            arbiter.deregister(id);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

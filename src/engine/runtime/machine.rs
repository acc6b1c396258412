//! ### English
//! Pure render-loop transition function.
//!
//! [`evaluate`] runs one top-to-bottom pass over a loop's state under the monitor and
//! says what to do next. It performs no I/O and never blocks; the render thread is a thin
//! driver that executes the returned [`Action`]s (still under the monitor) and then the
//! [`Next`] step (outside it).
//!
//! ### 中文
//! 纯函数形式的渲染循环状态转移。
//!
//! [`evaluate`] 在监视器内对循环状态自上而下执行一遍，并给出下一步要做什么。
//! 它不做 I/O、从不阻塞；渲染线程只是一个薄驱动层：先执行返回的 [`Action`]
//! （仍在监视器内），再执行 [`Next`] 步骤（在监视器外）。

use dpi::PhysicalSize;
use log::debug;

use crate::engine::arbiter::{Acquire, ArbiterState, LoopId};

use super::queue::Callable;
use super::state::LoopState;

/// ### English
/// Conceptual lifecycle phase derived from the flags, for diagnostics.
///
/// ### 中文
/// 由各标志推导出的概念生命周期阶段，用于诊断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    WaitingForSurface,
    AcquiringContext,
    CreatingSurface,
    Rendering,
    Paused,
    Exited,
}

pub(crate) fn phase(state: &LoopState) -> Phase {
    if state.exited || state.should_exit {
        Phase::Exited
    } else if state.paused {
        Phase::Paused
    } else if !state.has_surface || state.waiting_for_surface {
        Phase::WaitingForSurface
    } else if !state.have_context {
        Phase::AcquiringContext
    } else if !state.have_surface || !state.finished_creating_surface {
        Phase::CreatingSurface
    } else {
        Phase::Rendering
    }
}

/// ### English
/// Bookkeeping private to the render thread (never touched by other threads).
///
/// ### 中文
/// 渲染线程私有的记录（其他线程从不访问）。
#[derive(Debug, Default)]
pub(crate) struct Locals {
    pub(crate) lost_context: bool,
    /// ### English
    /// We just gave our context away on request; skip one acquisition so the requester
    /// gets a chance.
    ///
    /// ### 中文
    /// 刚应请求交出上下文；跳过一次获取，让请求方有机会拿到。
    pub(crate) asked_to_release_context: bool,
    /// ### English
    /// A new context exists; `on_surface_created` is owed.
    ///
    /// ### 中文
    /// 已有新上下文；需要调用 `on_surface_created`。
    pub(crate) create_context: bool,
    pub(crate) create_surface: bool,
    /// ### English
    /// First surface on a fresh context; run the arbiter's driver check.
    ///
    /// ### 中文
    /// 新上下文上的首个表面；执行仲裁器的驱动检查。
    pub(crate) probe_driver: bool,
    /// ### English
    /// `on_surface_changed(size)` is owed.
    ///
    /// ### 中文
    /// 需要调用 `on_surface_changed(size)`。
    pub(crate) size_changed: bool,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) want_render_notification: bool,
    /// ### English
    /// A frame finished and a waiter asked to hear about it.
    ///
    /// ### 中文
    /// 一帧已完成，且有等待者要求收到通知。
    pub(crate) notify_pending: bool,
    /// ### English
    /// Pause state last delivered to the callback.
    ///
    /// ### 中文
    /// 最近一次传达给回调的暂停状态。
    pub(crate) callback_paused: bool,
}

/// ### English
/// Resource operations, executed in order while the monitor is still held.
///
/// ### 中文
/// 资源操作，在仍持有监视器时按顺序执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    DestroySurface,
    /// ### English
    /// The token has already been released in the state.
    ///
    /// ### 中文
    /// 令牌已在状态中释放。
    DestroyContext,
    Terminate,
    /// ### English
    /// The token has already been taken in the state; on failure the driver undoes it.
    ///
    /// ### 中文
    /// 令牌已在状态中获取；失败时由驱动层撤销。
    CreateContext,
    RequestRelease(LoopId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Pause,
    Resume,
}

/// ### English
/// What the driver does once the monitor is released.
///
/// ### 中文
/// 释放监视器后驱动层要做的事情。
pub(crate) enum Next {
    Exit,
    RunCallable(Callable),
    Hook(Hook),
    Draw,
    /// ### English
    /// Nothing can progress; wait on the condition variable.
    ///
    /// ### 中文
    /// 无法继续推进；在条件变量上等待。
    Wait,
}

pub(crate) struct Evaluation {
    pub(crate) actions: Vec<Action>,
    pub(crate) next: Next,
    pub(crate) notify: bool,
}

struct Pass {
    actions: Vec<Action>,
    notify: bool,
}

impl Pass {
    fn finish(self, next: Next) -> Evaluation {
        Evaluation {
            actions: self.actions,
            next,
            notify: self.notify,
        }
    }

    fn stop_surface(&mut self, state: &mut LoopState) {
        if state.have_surface {
            state.have_surface = false;
            self.actions.push(Action::DestroySurface);
        }
    }

    fn stop_context(&mut self, id: LoopId, state: &mut LoopState, arbiter: &mut ArbiterState) {
        if state.have_context {
            state.have_context = false;
            self.actions.push(Action::DestroyContext);
            arbiter.release(id);
            self.notify = true;
        }
    }
}

/// ### English
/// One evaluation pass. Order matters and mirrors the loop contract:
/// exit, queued callables, pause hook, pause edge, release requests, surface edges,
/// render notification, ready-to-draw, wait.
///
/// ### 中文
/// 一次求值。顺序很重要，并与循环契约一致：
/// 退出、排队的可调用对象、暂停回调、暂停边沿、释放请求、表面边沿、渲染通知、
/// 可绘制判定、等待。
pub(crate) fn evaluate(
    id: LoopId,
    state: &mut LoopState,
    locals: &mut Locals,
    arbiter: &mut ArbiterState,
) -> Evaluation {
    let mut pass = Pass {
        actions: Vec::new(),
        notify: false,
    };

    if state.should_exit {
        return pass.finish(Next::Exit);
    }

    if let Some(callable) = state.queue.pop() {
        return pass.finish(Next::RunCallable(callable));
    }

    if state.request_paused != locals.callback_paused {
        let hook = if state.request_paused {
            Hook::Pause
        } else {
            Hook::Resume
        };
        return pass.finish(Next::Hook(hook));
    }

    let mut pausing = false;
    if state.paused != locals.callback_paused {
        pausing = locals.callback_paused;
        state.paused = locals.callback_paused;
        pass.notify = true;
        debug!("render loop {id}: paused is now {}", state.paused);
    }

    if state.should_release_context {
        debug!("render loop {id}: releasing context on request");
        locals.asked_to_release_context = state.have_context;
        pass.stop_surface(state);
        pass.stop_context(id, state, arbiter);
        state.should_release_context = false;
        state.release_requested_by = None;
    }

    if locals.lost_context {
        pass.stop_surface(state);
        pass.stop_context(id, state, arbiter);
        locals.lost_context = false;
    }

    if pausing {
        pass.stop_surface(state);
        if state.have_context
            && (!state.preserve_context_on_pause || arbiter.should_release_on_pause())
        {
            debug!("render loop {id}: releasing context because paused");
            pass.stop_context(id, state, arbiter);
        }
        if arbiter.should_terminate_on_pause() {
            // Terminating takes every context on the display with it.
            pass.stop_context(id, state, arbiter);
            pass.actions.push(Action::Terminate);
        }
    }

    if !state.has_surface && !state.waiting_for_surface {
        debug!("render loop {id}: noticed surface lost");
        pass.stop_surface(state);
        state.waiting_for_surface = true;
        state.surface_is_bad = false;
        pass.notify = true;
    }

    if state.has_surface && state.waiting_for_surface {
        debug!("render loop {id}: noticed surface acquired");
        state.waiting_for_surface = false;
        pass.notify = true;
    }

    if locals.notify_pending {
        state.want_render_notification = false;
        state.render_complete = true;
        locals.notify_pending = false;
        pass.notify = true;
    }

    if state.ready_to_draw() {
        if !state.have_context {
            if locals.asked_to_release_context {
                locals.asked_to_release_context = false;
            } else {
                match arbiter.try_acquire(id) {
                    Acquire::Granted | Acquire::Shared => {
                        pass.actions.push(Action::CreateContext);
                        state.have_context = true;
                        locals.create_context = true;
                        pass.notify = true;
                    }
                    Acquire::Denied { owner } => {
                        pass.actions.push(Action::RequestRelease(owner));
                        pass.notify = true;
                    }
                }
            }
        }

        if state.have_context && !state.have_surface {
            state.have_surface = true;
            locals.create_surface = true;
            locals.probe_driver = true;
            locals.size_changed = true;
            locals.size = state.size;
        }

        if state.have_surface {
            if state.size_changed {
                locals.size_changed = true;
                locals.size = state.size;
                state.want_render_notification = true;
                locals.create_surface = true;
                state.size_changed = false;
            }
            state.request_render = false;
            pass.notify = true;
            if state.want_render_notification {
                locals.want_render_notification = true;
            }
            return pass.finish(Next::Draw);
        }
    }

    pass.finish(Next::Wait)
}

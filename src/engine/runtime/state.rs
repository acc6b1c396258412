//! ### English
//! Per-loop state shared between the render thread and its controller.
//!
//! Every field is read and written only while the arbiter monitor is held.
//!
//! ### 中文
//! 渲染线程与其控制器之间共享的每循环状态。
//!
//! 所有字段只在持有仲裁器监视器时读写。

use std::fmt;
use std::thread::{self, ThreadId};

use dpi::PhysicalSize;

use crate::engine::arbiter::LoopId;
use crate::engine::error::{BackendError, ControlError};

use super::config::LoopConfig;
use super::queue::CallableQueue;

/// ### English
/// Raw value of [`RenderMode::WhenDirty`].
///
/// ### 中文
/// [`RenderMode::WhenDirty`] 的原始值。
pub const RENDERMODE_WHEN_DIRTY: i32 = 0;

/// ### English
/// Raw value of [`RenderMode::Continuously`].
///
/// ### 中文
/// [`RenderMode::Continuously`] 的原始值。
pub const RENDERMODE_CONTINUOUSLY: i32 = 1;

/// ### English
/// Frame cadence policy.
///
/// ### 中文
/// 帧节奏策略。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// ### English
    /// Draw when the surface is created or resized, or when a render is requested.
    ///
    /// ### 中文
    /// 仅在表面创建或尺寸变化、或收到渲染请求时绘制。
    WhenDirty,
    /// ### English
    /// Draw on every loop iteration.
    ///
    /// ### 中文
    /// 每次循环迭代都绘制。
    #[default]
    Continuously,
}

impl TryFrom<i32> for RenderMode {
    type Error = ControlError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            RENDERMODE_WHEN_DIRTY => Ok(Self::WhenDirty),
            RENDERMODE_CONTINUOUSLY => Ok(Self::Continuously),
            other => Err(ControlError::InvalidRenderMode(other)),
        }
    }
}

impl From<RenderMode> for i32 {
    fn from(mode: RenderMode) -> Self {
        match mode {
            RenderMode::WhenDirty => RENDERMODE_WHEN_DIRTY,
            RenderMode::Continuously => RENDERMODE_CONTINUOUSLY,
        }
    }
}

pub(crate) struct LoopState {
    pub(crate) should_exit: bool,
    pub(crate) exited: bool,
    pub(crate) request_paused: bool,
    pub(crate) paused: bool,
    /// ### English
    /// The host says a native surface exists.
    ///
    /// ### 中文
    /// 宿主声明原生表面存在。
    pub(crate) has_surface: bool,
    pub(crate) surface_is_bad: bool,
    /// ### English
    /// The render thread has acknowledged that no host surface exists.
    ///
    /// ### 中文
    /// 渲染线程已确认宿主表面不存在。
    pub(crate) waiting_for_surface: bool,
    pub(crate) have_context: bool,
    pub(crate) have_surface: bool,
    pub(crate) finished_creating_surface: bool,
    pub(crate) should_release_context: bool,
    /// ### English
    /// The loop that was denied the token and asked for `should_release_context`.
    ///
    /// ### 中文
    /// 获取令牌被拒、并发出 `should_release_context` 请求的循环。
    pub(crate) release_requested_by: Option<LoopId>,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) size_changed: bool,
    pub(crate) render_mode: RenderMode,
    pub(crate) request_render: bool,
    pub(crate) want_render_notification: bool,
    pub(crate) render_complete: bool,
    pub(crate) preserve_context_on_pause: bool,
    pub(crate) queue: CallableQueue,
    /// ### English
    /// Why the thread stopped, when it stopped on a fatal error.
    ///
    /// ### 中文
    /// 线程因致命错误停止时的原因。
    pub(crate) failure: Option<BackendError>,
    pub(crate) thread: Option<ThreadId>,
    /// ### English
    /// The controller went away while the thread was still running; the thread removes its
    /// own registry entry on exit.
    ///
    /// ### 中文
    /// 控制器在线程仍运行时已被释放；线程退出时自行移除登记项。
    pub(crate) orphaned: bool,
}

impl LoopState {
    pub(crate) fn new(config: &LoopConfig) -> Self {
        Self {
            should_exit: false,
            exited: false,
            request_paused: false,
            paused: false,
            has_surface: false,
            surface_is_bad: false,
            waiting_for_surface: false,
            have_context: false,
            have_surface: false,
            finished_creating_surface: false,
            should_release_context: false,
            release_requested_by: None,
            size: config.initial_size,
            size_changed: true,
            render_mode: config.render_mode,
            request_render: true,
            want_render_notification: false,
            render_complete: false,
            preserve_context_on_pause: config.preserve_context_on_pause,
            queue: CallableQueue::default(),
            failure: None,
            thread: None,
            orphaned: false,
        }
    }

    /// ### English
    /// Everything except resources: the loop would go on to acquire and draw.
    ///
    /// ### 中文
    /// 除资源外的全部条件：满足时循环会继续获取资源并绘制。
    pub(crate) fn ready_to_draw(&self) -> bool {
        self.can_produce_frame()
            && (self.request_render || self.render_mode == RenderMode::Continuously)
    }

    /// ### English
    /// Resources are in place and a frame can be produced. Ignores `request_render`, which
    /// the loop clears before it draws.
    ///
    /// ### 中文
    /// 资源已就绪且可以产出帧。不考虑 `request_render`，因为循环在绘制前就会清除它。
    pub(crate) fn able_to_draw(&self) -> bool {
        self.have_context && self.have_surface && self.can_produce_frame()
    }

    /// ### English
    /// A requested frame will eventually be produced (ignoring arbitration).
    ///
    /// ### 中文
    /// 被请求的帧最终会被产出（不考虑仲裁）。
    pub(crate) fn can_produce_frame(&self) -> bool {
        !self.paused
            && self.has_surface
            && !self.surface_is_bad
            && self.size.width > 0
            && self.size.height > 0
    }

    /// ### English
    /// Still running, holds no context and would acquire one on its next pass.
    ///
    /// ### 中文
    /// 仍在运行、未持有上下文，且下一轮会尝试获取上下文。
    pub(crate) fn wants_context(&self) -> bool {
        !self.exited && !self.should_exit && !self.have_context && self.ready_to_draw()
    }

    pub(crate) fn is_render_thread(&self) -> bool {
        self.thread == Some(thread::current().id())
    }
}

impl fmt::Debug for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopState")
            .field("have_context", &self.have_context)
            .field("have_surface", &self.have_surface)
            .field("finished_creating_surface", &self.finished_creating_surface)
            .field("paused", &self.paused)
            .field("has_surface", &self.has_surface)
            .field("surface_is_bad", &self.surface_is_bad)
            .field("waiting_for_surface", &self.waiting_for_surface)
            .field("size", &(self.size.width, self.size.height))
            .field("request_render", &self.request_render)
            .field("render_mode", &self.render_mode)
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_render_modes_validate() {
        assert_eq!(RenderMode::try_from(0).unwrap(), RenderMode::WhenDirty);
        assert_eq!(RenderMode::try_from(1).unwrap(), RenderMode::Continuously);
        assert!(matches!(
            RenderMode::try_from(2),
            Err(ControlError::InvalidRenderMode(2))
        ));
        assert!(RenderMode::try_from(-1).is_err());
        assert_eq!(i32::from(RenderMode::WhenDirty), RENDERMODE_WHEN_DIRTY);
    }

    #[test]
    fn ready_to_draw_needs_every_condition() {
        let mut state = LoopState::new(&LoopConfig::default().with_initial_size(100, 100));
        assert!(!state.ready_to_draw());
        state.has_surface = true;
        assert!(state.ready_to_draw());

        state.size = PhysicalSize::new(100, 0);
        assert!(!state.ready_to_draw());
        state.size = PhysicalSize::new(100, 100);

        state.surface_is_bad = true;
        assert!(!state.ready_to_draw());
        state.surface_is_bad = false;

        state.paused = true;
        assert!(!state.ready_to_draw());
        state.paused = false;

        state.render_mode = RenderMode::WhenDirty;
        state.request_render = false;
        assert!(!state.ready_to_draw());
        state.request_render = true;
        assert!(state.ready_to_draw());
        assert!(!state.able_to_draw());
    }

    #[test]
    fn exiting_loop_no_longer_wants_context() {
        let mut state = LoopState::new(&LoopConfig::default().with_initial_size(8, 8));
        state.has_surface = true;
        assert!(state.wants_context());
        state.have_context = true;
        assert!(!state.wants_context());
        state.have_context = false;
        state.should_exit = true;
        assert!(!state.wants_context());
        state.should_exit = false;
        state.exited = true;
        assert!(!state.wants_context());
    }
}

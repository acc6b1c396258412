//! ### English
//! Host rendering callbacks and the detachable slot that holds them.
//!
//! ### 中文
//! 宿主渲染回调，以及持有它们的可分离槽位。

use std::sync::{Mutex, PoisonError};

use dpi::PhysicalSize;

use crate::engine::rendering::SurfaceConfig;

/// ### English
/// Host drawing code. Every method runs on the render thread, never under the arbiter
/// monitor, so it may call back into the controller (except the blocking operations).
///
/// ### 中文
/// 宿主的绘制代码。所有方法都在渲染线程上运行，且从不在仲裁器监视器内执行，
/// 因此可以回调控制器（阻塞操作除外）。
pub trait RenderCallback: Send + 'static {
    /// ### English
    /// The render thread started.
    ///
    /// ### 中文
    /// 渲染线程已启动。
    fn on_start(&mut self) {}

    /// ### English
    /// The render thread is about to stop. Always the last callback.
    ///
    /// ### 中文
    /// 渲染线程即将停止。总是最后一个回调。
    fn on_exit(&mut self) {}

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    /// ### English
    /// A new context and surface were created; all previously created GPU objects are gone.
    ///
    /// ### 中文
    /// 新的上下文与表面已创建；之前创建的所有 GPU 对象都已失效。
    fn on_surface_created(&mut self, _config: &SurfaceConfig) {}

    fn on_surface_changed(&mut self, _size: PhysicalSize<u32>) {}

    /// ### English
    /// Draws one frame. Return `true` when the frame should be presented.
    ///
    /// ### 中文
    /// 绘制一帧。需要呈现该帧时返回 `true`。
    fn on_draw_frame(&mut self) -> bool;
}

/// ### English
/// Holds the callback until it is detached. Only the render thread and `detach` touch it.
///
/// ### 中文
/// 在分离之前持有回调。只有渲染线程和 `detach` 会访问它。
pub(crate) struct CallbackSlot {
    callback: Mutex<Option<Box<dyn RenderCallback>>>,
}

impl CallbackSlot {
    pub(crate) fn new(callback: Box<dyn RenderCallback>) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
        }
    }

    /// ### English
    /// Runs `f` against the callback; returns `None` once detached.
    ///
    /// ### 中文
    /// 对回调执行 `f`；分离后返回 `None`。
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut dyn RenderCallback) -> R) -> Option<R> {
        let mut guard = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.as_mut().map(|callback| f(&mut **callback))
    }

    pub(crate) fn detach(&self) -> Option<Box<dyn RenderCallback>> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

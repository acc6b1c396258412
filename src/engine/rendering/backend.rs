//! ### English
//! Graphics backend adapter driven by the render thread.
//!
//! ### 中文
//! 由渲染线程驱动的图形后端适配器。

use crate::engine::arbiter::CapabilityProbe;
use crate::engine::error::BackendError;

use super::config::SurfaceConfig;

/// ### English
/// Result of presenting one frame.
///
/// ### 中文
/// 呈现一帧的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapResult {
    Success,
    /// ### English
    /// The context is gone; the loop tears down context and surface and re-acquires.
    ///
    /// ### 中文
    /// 上下文已丢失；循环会销毁上下文与表面并重新获取。
    ContextLost,
    /// ### English
    /// Any other failure, usually a surface destroyed before the host told us. The surface
    /// is marked bad until the host reports a fresh one.
    ///
    /// ### 中文
    /// 其他任何失败，通常是宿主尚未通知而表面已被销毁。表面会被标记为损坏，
    /// 直到宿主报告新的表面。
    SurfaceError(i32),
}

/// ### English
/// Platform context/surface factory plus the present call.
///
/// The adapter is moved onto the render thread and only ever called from there.
/// `create_context`, `destroy_context`, `destroy_surface` and `terminate` run while the
/// arbiter monitor is held, so they must not call back into the controller.
///
/// ### 中文
/// 平台上下文/表面工厂以及呈现调用。
///
/// 适配器会被移交到渲染线程，并且只在该线程上调用。
/// `create_context`、`destroy_context`、`destroy_surface` 与 `terminate` 在持有仲裁器监视器时
/// 执行，因此不得回调控制器。
pub trait GraphicsBackend: Send {
    /// ### English
    /// Creates the rendering context. An error here is fatal for the render thread.
    ///
    /// ### 中文
    /// 创建渲染上下文。此处出错对渲染线程是致命的。
    fn create_context(&mut self) -> Result<(), BackendError>;

    fn destroy_context(&mut self);

    /// ### English
    /// Creates the drawable surface, replacing any current one. `false` marks the surface bad.
    ///
    /// ### 中文
    /// 创建可绘制表面，替换已有表面。返回 `false` 会把表面标记为损坏。
    fn create_surface(&mut self) -> bool;

    fn destroy_surface(&mut self);

    fn swap_buffers(&mut self) -> SwapResult;

    /// ### English
    /// Shuts down the whole graphics subsystem (display connection). Called on pause when
    /// the arbiter says contexts cannot coexist.
    ///
    /// ### 中文
    /// 关闭整个图形子系统（显示连接）。当仲裁器认为上下文不能共存时在暂停时调用。
    fn terminate(&mut self);

    /// ### English
    /// Configuration handed to `on_surface_created`.
    ///
    /// ### 中文
    /// 传给 `on_surface_created` 的配置。
    fn config(&self) -> SurfaceConfig {
        SurfaceConfig::default()
    }

    /// ### English
    /// Driver facts for the arbiter's one-time driver check; `None` uses the arbiter's probe.
    ///
    /// ### 中文
    /// 供仲裁器一次性驱动检查使用的驱动信息；`None` 表示使用仲裁器自身的探测器。
    fn probe(&self) -> Option<&dyn CapabilityProbe> {
        None
    }
}

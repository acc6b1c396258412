//! ### English
//! Error types reported by the render-loop control plane and by backend adapters.
//!
//! ### 中文
//! 渲染循环控制面与后端适配器上报的错误类型。

use std::io;

use thiserror::Error;

/// ### English
/// Usage errors returned to the caller of a [`crate::SurfaceController`] operation.
///
/// These are never swallowed: each one means the call did not take effect.
///
/// ### 中文
/// 返回给 [`crate::SurfaceController`] 调用方的用法错误。
///
/// 这些错误不会被吞掉：每一种都表示本次调用没有生效。
#[derive(Debug, Error)]
pub enum ControlError {
    /// ### English
    /// Raw render mode outside `{0, 1}`.
    ///
    /// ### 中文
    /// 原始渲染模式不在 `{0, 1}` 范围内。
    #[error("invalid render mode: {0}")]
    InvalidRenderMode(i32),

    /// ### English
    /// A blocking operation was called from the render thread it would wait on.
    ///
    /// ### 中文
    /// 在渲染线程上调用了需要等待该线程本身的阻塞操作。
    #[error("`{0}` must not be called from the render thread")]
    OnRenderThread(&'static str),

    /// ### English
    /// The render loop has already exited.
    ///
    /// ### 中文
    /// 渲染循环已经退出。
    #[error("render loop has exited")]
    Exited,

    /// ### English
    /// The OS refused to spawn the render thread.
    ///
    /// ### 中文
    /// 操作系统拒绝创建渲染线程。
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] io::Error),
}

/// ### English
/// Errors produced by a [`crate::GraphicsBackend`].
///
/// A `ContextCreation` failure stops the render thread for good; the stored copy is
/// available through [`crate::SurfaceController::failure`].
///
/// ### 中文
/// [`crate::GraphicsBackend`] 产生的错误。
///
/// `ContextCreation` 失败会永久停止渲染线程；其副本可通过
/// [`crate::SurfaceController::failure`] 获取。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("failed to create context: {0}")]
    ContextCreation(String),

    #[error("backend error: {0}")]
    Backend(String),
}

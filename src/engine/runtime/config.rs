//! ### English
//! Per-loop configuration.
//!
//! ### 中文
//! 每个循环的配置。

use dpi::PhysicalSize;

use crate::engine::flags;

use super::state::RenderMode;

/// ### English
/// Settings applied when a [`crate::SurfaceController`] is constructed.
///
/// ### 中文
/// 构造 [`crate::SurfaceController`] 时应用的设置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// ### English
    /// Initial frame cadence. Defaults to `Continuously`.
    ///
    /// ### 中文
    /// 初始帧节奏。默认 `Continuously`。
    pub render_mode: RenderMode,
    /// ### English
    /// Keep the context while paused when the arbiter allows it.
    ///
    /// ### 中文
    /// 在仲裁器允许时，暂停期间保留上下文。
    pub preserve_context_on_pause: bool,
    /// ### English
    /// Size known before the first resize callback. `0×0` blocks drawing until a resize.
    ///
    /// ### 中文
    /// 首次 resize 回调之前已知的尺寸。`0×0` 会阻止绘制，直到收到 resize。
    pub initial_size: PhysicalSize<u32>,
    /// ### English
    /// Render thread name; `None` uses `"RenderLoop <id>"`.
    ///
    /// ### 中文
    /// 渲染线程名；`None` 时使用 `"RenderLoop <id>"`。
    pub thread_name: Option<String>,
    pub log_frames: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Continuously,
            preserve_context_on_pause: false,
            initial_size: PhysicalSize::new(0, 0),
            thread_name: None,
            log_frames: false,
        }
    }
}

impl LoopConfig {
    /// ### English
    /// Folds a `RENDER_LOOP_FLAG_*` word into this config. Unknown bits are ignored.
    ///
    /// ### 中文
    /// 把 `RENDER_LOOP_FLAG_*` 标志字合入本配置。未知位会被忽略。
    pub fn with_flags(mut self, flags: u32) -> Self {
        if flags & flags::RENDER_LOOP_FLAG_PRESERVE_CONTEXT_ON_PAUSE != 0 {
            self.preserve_context_on_pause = true;
        }
        if flags & flags::RENDER_LOOP_FLAG_WHEN_DIRTY != 0 {
            self.render_mode = RenderMode::WhenDirty;
        }
        if flags & flags::RENDER_LOOP_FLAG_LOG_FRAMES != 0 {
            self.log_frames = true;
        }
        self
    }

    pub fn with_initial_size(mut self, width: u32, height: u32) -> Self {
        self.initial_size = PhysicalSize::new(width, height);
        self
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }
}

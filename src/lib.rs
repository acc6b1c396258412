/// ### English
/// `surface_render_thread` crate root.
/// A dedicated render thread per surface, driven by host lifecycle events, with a shared
/// arbiter serializing access to a scarce rendering context. Core implementation lives
/// under `engine`.
///
/// ### 中文
/// `surface_render_thread` 的 crate 根。
/// 每个表面一个专属渲染线程，由宿主生命周期事件驱动，并由共享仲裁器串行化对稀缺渲染
/// 上下文的访问。核心实现位于 `engine` 模块。
mod engine;

pub use engine::arbiter::{Capabilities, CapabilityProbe, ContextArbiter, LoopId, StaticProbe};
pub use engine::error::{BackendError, ControlError};
pub use engine::flags::{
    RENDER_LOOP_FLAG_LOG_FRAMES, RENDER_LOOP_FLAG_PRESERVE_CONTEXT_ON_PAUSE,
    RENDER_LOOP_FLAG_WHEN_DIRTY, RENDER_LOOP_FLAGS_ALL,
};
pub use engine::logging::{LoggingConfig, init_logging};
pub use engine::rendering::{
    GlowProbe, GraphicsBackend, SurfaceConfig, SwapResult, choose_best_config,
    encode_api_version, parse_gl_version,
};
pub use engine::runtime::{
    LoopConfig, Phase, RENDERMODE_CONTINUOUSLY, RENDERMODE_WHEN_DIRTY, RenderCallback,
    RenderMode, SurfaceController,
};

//! ### English
//! Bitflags controlling optional render-loop behaviors.
//!
//! Hosts that carry configuration as a plain `u32` word fold it into a
//! [`crate::LoopConfig`] with [`crate::LoopConfig::with_flags`].
//!
//! ### 中文
//! 控制渲染循环可选行为的位标志（bitflags）。
//!
//! 以 `u32` 传递配置的宿主可通过 [`crate::LoopConfig::with_flags`] 将其合入
//! [`crate::LoopConfig`]。

/// ### English
/// Keep the context alive across pause when the arbiter says that is safe.
///
/// Devices with a limited number of contexts still release it.
///
/// ### 中文
/// 在仲裁器认为安全时，暂停期间保留上下文。
///
/// 上下文数量受限的设备仍会释放它。
pub const RENDER_LOOP_FLAG_PRESERVE_CONTEXT_ON_PAUSE: u32 = 1 << 0;

/// ### English
/// Start in `WhenDirty` mode instead of `Continuously`.
///
/// ### 中文
/// 以 `WhenDirty` 模式启动，而不是 `Continuously`。
pub const RENDER_LOOP_FLAG_WHEN_DIRTY: u32 = 1 << 1;

/// ### English
/// Log every frame at `debug` level (otherwise `trace`).
///
/// ### 中文
/// 以 `debug` 级别记录每一帧（否则为 `trace`）。
pub const RENDER_LOOP_FLAG_LOG_FRAMES: u32 = 1 << 2;

/// ### English
/// Every flag this crate understands.
///
/// ### 中文
/// 本 crate 识别的全部标志。
pub const RENDER_LOOP_FLAGS_ALL: u32 = RENDER_LOOP_FLAG_PRESERVE_CONTEXT_ON_PAUSE
    | RENDER_LOOP_FLAG_WHEN_DIRTY
    | RENDER_LOOP_FLAG_LOG_FRAMES;

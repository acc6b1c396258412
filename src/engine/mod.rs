/// ### English
/// Engine internal modules (context arbitration, render loop runtime, backend adapters).
///
/// ### 中文
/// 引擎内部模块（上下文仲裁、渲染循环运行时、后端适配层等）。
pub mod arbiter;
pub mod error;
pub mod flags;
pub mod logging;
pub mod rendering;
pub mod runtime;

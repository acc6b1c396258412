//! ### English
//! Render loop runtime: per-loop state, the pure transition function, the render thread
//! driver, and the owner-facing controller (public API).
//!
//! ### 中文
//! 渲染循环运行时：每循环状态、纯状态转移函数、渲染线程驱动层，
//! 以及面向所有者的控制器（对外公开 API）。

mod callback;
mod config;
mod controller;
mod machine;
mod queue;
mod render_loop;
mod state;

pub use callback::RenderCallback;
pub use config::LoopConfig;
pub use controller::SurfaceController;
pub use machine::Phase;
pub use state::{RENDERMODE_CONTINUOUSLY, RENDERMODE_WHEN_DIRTY, RenderMode};

pub(crate) use state::LoopState;

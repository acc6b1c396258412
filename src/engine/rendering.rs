//! ### English
//! Rendering adapters: the backend contract, surface configuration choice, and a `glow`
//! capability probe.
//!
//! ### 中文
//! 渲染适配层：后端契约、表面配置选择，以及基于 `glow` 的能力探测器。

mod backend;
mod config;
mod gl_probe;

pub use backend::{GraphicsBackend, SwapResult};
pub use config::{SurfaceConfig, choose_best_config};
pub use gl_probe::{GlowProbe, encode_api_version, parse_gl_version};

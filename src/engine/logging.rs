//! ### English
//! Logger initialization for hosts and tests.
//!
//! The crate itself only talks to the `log` facade; this helper wires up `env_logger`
//! for hosts that do not install their own logger.
//!
//! ### 中文
//! 面向宿主与测试的日志初始化。
//!
//! crate 内部只使用 `log` 门面；该辅助函数为未自行安装 logger 的宿主接入 `env_logger`。

use std::sync::Once;

/// ### English
/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax
/// (e.g. `"info"`, `"surface_render_thread=trace"`).
///
/// ### 中文
/// 日志配置。
///
/// `env_filter` 遵循 `env_logger` 的过滤语法
/// （例如 `"info"`、`"surface_render_thread=trace"`）。
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

static INIT: Once = Once::new();

/// ### English
/// Initializes the global logger once; later calls are ignored.
///
/// Falls back to `RUST_LOG`, then to `info`. If another logger is already installed the
/// call is a no-op.
///
/// ### 中文
/// 只初始化一次全局 logger；之后的调用会被忽略。
///
/// 依次回退到 `RUST_LOG` 与 `info`。若已安装其他 logger，则本调用不做任何事。
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);
        builder.is_test(config.is_test);

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

//! ### English
//! Capability probe consumed by the context arbiter.
//!
//! ### 中文
//! 上下文仲裁器使用的能力探测接口。

/// ### English
/// Platform/driver facts the arbiter needs to decide whether several contexts may coexist.
///
/// The arbiter queries a probe at most once for the version facts and once more for the
/// driver identifier, then caches the result.
///
/// ### 中文
/// 仲裁器判断多个上下文能否共存所需的平台/驱动信息。
///
/// 仲裁器对版本信息最多查询一次，对驱动标识再查询一次，然后缓存结果。
pub trait CapabilityProbe: Send + Sync {
    /// ### English
    /// Renderer/driver identifier (e.g. `GL_RENDERER`), if known.
    ///
    /// ### 中文
    /// 渲染器/驱动标识（例如 `GL_RENDERER`），未知时为 `None`。
    fn renderer(&self) -> Option<String>;

    /// ### English
    /// Platform API level encoded as `(major << 16) | minor`; `0` when undefined.
    ///
    /// ### 中文
    /// 平台 API 级别，编码为 `(major << 16) | minor`；未定义时为 `0`。
    fn api_version(&self) -> u32;

    /// ### English
    /// Whether the platform advertises native multi-context support.
    ///
    /// ### 中文
    /// 平台是否声明原生支持多上下文。
    fn multiple_contexts_supported(&self) -> bool {
        false
    }
}

/// ### English
/// Probe with fixed answers. The default reports nothing (version `0`, no renderer).
///
/// ### 中文
/// 返回固定结果的探测器。默认值不报告任何信息（版本 `0`，无渲染器）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProbe {
    pub renderer: Option<String>,
    pub api_version: u32,
    pub multiple_contexts_supported: bool,
}

impl StaticProbe {
    pub fn new(renderer: Option<&str>, api_version: u32, multiple_contexts_supported: bool) -> Self {
        Self {
            renderer: renderer.map(str::to_owned),
            api_version,
            multiple_contexts_supported,
        }
    }
}

impl CapabilityProbe for StaticProbe {
    fn renderer(&self) -> Option<String> {
        self.renderer.clone()
    }

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn multiple_contexts_supported(&self) -> bool {
        self.multiple_contexts_supported
    }
}

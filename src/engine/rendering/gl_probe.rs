//! ### English
//! Capability probe backed by an OpenGL / OpenGL ES context loaded through `glow`.
//!
//! ### 中文
//! 基于通过 `glow` 加载的 OpenGL / OpenGL ES 上下文的能力探测器。

use glow::HasContext as _;

use crate::engine::arbiter::CapabilityProbe;

/// ### English
/// Parses the leading `major.minor` out of a `GL_VERSION` string.
///
/// Expected forms: `"4.6.0 ..."` or `"OpenGL ES 3.2 ..."`. Unparsable parts become `0`.
///
/// ### 中文
/// 从 `GL_VERSION` 字符串中解析开头的 `major.minor`。
///
/// 期望的形式：`"4.6.0 ..."` 或 `"OpenGL ES 3.2 ..."`。无法解析的部分记为 `0`。
pub fn parse_gl_version(version: &str) -> (u32, u32) {
    let Some(token) = version
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
    else {
        return (0, 0);
    };
    let mut parts = token.split('.');
    let mut next = || {
        parts
            .next()
            .map(|part| part.trim_end_matches(|c: char| !c.is_ascii_digit()))
            .and_then(|part| part.parse::<u32>().ok())
            .unwrap_or(0)
    };
    let major = next();
    let minor = next();
    (major, minor)
}

/// ### English
/// Encodes a version pair the way [`CapabilityProbe::api_version`] expects.
///
/// ### 中文
/// 按 [`CapabilityProbe::api_version`] 期望的方式编码版本号。
pub fn encode_api_version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor & 0xffff)
}

/// ### English
/// Snapshot of `GL_RENDERER` / `GL_VERSION`.
///
/// Desktop GL advertises native multi-context support; GLES is judged by its version.
///
/// ### 中文
/// `GL_RENDERER` / `GL_VERSION` 的快照。
///
/// 桌面 GL 声明原生支持多上下文；GLES 则依据版本判断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlowProbe {
    renderer: String,
    api_version: u32,
    is_gles: bool,
}

impl GlowProbe {
    /// ### English
    /// Builds a probe from already-queried strings.
    ///
    /// ### 中文
    /// 由已查询到的字符串构建探测器。
    pub fn from_strings(renderer: &str, version: &str) -> Self {
        let (major, minor) = parse_gl_version(version);
        Self {
            renderer: renderer.to_owned(),
            api_version: encode_api_version(major, minor),
            is_gles: version.starts_with("OpenGL ES"),
        }
    }

    /// ### English
    /// Queries `gl` for its renderer and version.
    ///
    /// # Safety
    /// `gl` must be current on the calling thread.
    ///
    /// ### 中文
    /// 向 `gl` 查询渲染器与版本。
    ///
    /// # Safety
    /// `gl` 必须在调用线程上为 current。
    pub unsafe fn from_context(gl: &glow::Context) -> Self {
        let renderer = unsafe { gl.get_parameter_string(glow::RENDERER) };
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        Self::from_strings(&renderer, &version)
    }

    pub fn is_gles(&self) -> bool {
        self.is_gles
    }
}

impl CapabilityProbe for GlowProbe {
    fn renderer(&self) -> Option<String> {
        Some(self.renderer.clone())
    }

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn multiple_contexts_supported(&self) -> bool {
        !self.is_gles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktop_and_es_versions() {
        assert_eq!(parse_gl_version("4.6.0 NVIDIA 535.54"), (4, 6));
        assert_eq!(parse_gl_version("OpenGL ES 3.2 Mesa 23.1"), (3, 2));
        assert_eq!(parse_gl_version("OpenGL ES-CM 1.1"), (1, 1));
        assert_eq!(parse_gl_version("garbage"), (0, 0));
    }

    #[test]
    fn es2_is_multi_context_version() {
        let probe = GlowProbe::from_strings("Adreno", "OpenGL ES 2.0 V@1");
        assert!(probe.is_gles());
        assert_eq!(probe.api_version(), 0x20000);
        assert!(!probe.multiple_contexts_supported());
        assert_eq!(probe.renderer().as_deref(), Some("Adreno"));
    }

    #[test]
    fn desktop_gl_supports_multiple_contexts() {
        let probe = GlowProbe::from_strings("llvmpipe", "3.3 (Core Profile) Mesa");
        assert!(!probe.is_gles());
        assert!(probe.multiple_contexts_supported());
        assert_eq!(probe.api_version(), encode_api_version(3, 3));
    }
}

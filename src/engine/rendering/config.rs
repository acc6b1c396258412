//! ### English
//! Surface configuration attributes and best-config selection.
//!
//! ### 中文
//! 表面配置属性以及最佳配置选择。

/// ### English
/// Attribute set of one framebuffer configuration, as reported by the backend.
///
/// ### 中文
/// 后端报告的单个帧缓冲配置的属性集。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceConfig {
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub depth_size: u8,
    pub stencil_size: u8,
    pub sample_buffers: u8,
    pub samples: u8,
}

impl SurfaceConfig {
    /// ### English
    /// RGBA8888 without depth/stencil/multisampling.
    ///
    /// ### 中文
    /// 不带深度/模板/多重采样的 RGBA8888。
    pub const RGBA8888: Self = Self {
        red_size: 8,
        green_size: 8,
        blue_size: 8,
        alpha_size: 8,
        depth_size: 0,
        stencil_size: 0,
        sample_buffers: 0,
        samples: 0,
    };

    /// ### English
    /// Preference score: color, alpha and multisample attributes summed.
    /// Depth and stencil do not count.
    ///
    /// ### 中文
    /// 偏好分数：颜色、alpha 与多重采样属性之和。深度与模板不计入。
    pub fn score(&self) -> u32 {
        [
            self.red_size,
            self.green_size,
            self.blue_size,
            self.alpha_size,
            self.sample_buffers,
            self.samples,
        ]
        .into_iter()
        .map(u32::from)
        .sum()
    }
}

/// ### English
/// Picks the index of the highest-scoring configuration.
///
/// Ties keep the earliest entry, and index `0` is returned when nothing scores above zero,
/// so a non-empty list always yields a choice.
///
/// ### 中文
/// 选出分数最高的配置下标。
///
/// 同分时保留最早的条目；若没有任何配置分数大于零则返回下标 `0`，
/// 因此非空列表总能得到一个选择。
pub fn choose_best_config(configs: &[SurfaceConfig]) -> Option<usize> {
    if configs.is_empty() {
        return None;
    }
    let mut best = 0;
    let mut best_score = 0;
    for (index, config) in configs.iter().enumerate() {
        let score = config.score();
        if score > best_score {
            best_score = score;
            best = index;
        }
    }
    Some(best)
}

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{Palette, Placement, RasterFrame, Rgba, PALETTE_CAPACITY, TRANSPARENT};

/// 颜色计数超过容量后停在这个值，不再继续扫描
pub const UNIQUE_COLORS_SATURATED: usize = PALETTE_CAPACITY + 1;

/// 逐帧调色板的分析结果
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PaletteReport {
    /// 所有帧的调色板与第 0 帧长度相同、颜色和顺序一致
    pub identical_palettes: bool,
    /// 累计的不同颜色数量，超过 256 后饱和为 [`UNIQUE_COLORS_SATURATED`]
    pub unique_colors: usize,
}

impl PaletteReport {
    pub fn exceeds_capacity(&self) -> bool {
        self.unique_colors > PALETTE_CAPACITY
    }
}

/// 输出的颜色模式
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColorSpace {
    Paletted,
    TrueColor,
}

/// 合并调色板的统计
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Consolidation {
    /// 追加到主调色板的颜色数量
    pub appended: usize,
    /// 退化为最近色的颜色数量
    pub fallbacks: usize,
}

impl Consolidation {
    fn record(&mut self, placement: Placement) {
        match placement {
            Placement::Exact(_) => {}
            Placement::Appended(_) => self.appended += 1,
            Placement::Nearest(_) => self.fallbacks += 1,
        }
    }
}

/// 分析索引帧序列的调色板，真彩色帧视为调色板不一致且颜色数已饱和
pub fn analyze(frames: &[RasterFrame]) -> PaletteReport {
    let first = frames.first().and_then(RasterFrame::palette);
    let identical_palettes = match first {
        Some(first) => frames
            .iter()
            .all(|frame| frame.palette().map_or(false, |p| p == first)),
        None => false,
    };

    let mut seen: HashSet<Rgba> = HashSet::new();
    for frame in frames {
        let RasterFrame::Indexed {
            palette, indices, ..
        } = frame
        else {
            return PaletteReport {
                identical_palettes,
                unique_colors: UNIQUE_COLORS_SATURATED,
            };
        };
        // 越界索引解析为透明色，同样要占一个位置
        let stray = indices.iter().any(|&index| index as usize >= palette.len());
        let stray = stray.then_some(&TRANSPARENT);
        for color in palette.colors().iter().chain(stray) {
            seen.insert(*color);
            if seen.len() > PALETTE_CAPACITY {
                return PaletteReport {
                    identical_palettes,
                    unique_colors: UNIQUE_COLORS_SATURATED,
                };
            }
        }
    }

    PaletteReport {
        identical_palettes,
        unique_colors: seen.len(),
    }
}

/// 颜色超过 256 且未要求保持调色板时输出真彩色
pub fn decide(exceeds_capacity: bool, maintain_palette: bool) -> ColorSpace {
    if exceeds_capacity && !maintain_palette {
        ColorSpace::TrueColor
    } else {
        ColorSpace::Paletted
    }
}

/// 把所有帧的调色板合并为以第 0 帧颜色为种子的共享调色板，并重映射像素索引。
///
/// 每帧按本地索引顺序处理颜色：先在主调色板中找完全相同的颜色，找不到就追加，
/// 主调色板已满则取平方欧氏距离最近的颜色。该过程不会失败。
/// 本地调色板中重复的颜色只占主调色板的一个位置，本地调色板之外的索引映射到透明色。
/// 必须按帧顺序执行，后一帧的映射依赖前面各帧留下的主调色板。
pub fn consolidate(frames: &mut [RasterFrame]) -> Consolidation {
    let mut stats = Consolidation::default();
    let mut primary = Palette::default();
    let mut seeded = false;

    for frame in frames.iter_mut() {
        let RasterFrame::Indexed {
            palette, indices, ..
        } = frame
        else {
            continue;
        };

        let placements = primary.absorb(palette);
        if seeded {
            placements.iter().for_each(|&placement| stats.record(placement));
        }

        let mut fill = None;
        for index in indices.iter_mut() {
            *index = match placements.get(*index as usize) {
                Some(placement) => placement.index(),
                None => *fill.get_or_insert_with(|| {
                    let placement = primary.place(TRANSPARENT);
                    if seeded {
                        stats.record(placement);
                    }
                    placement.index()
                }),
            };
        }
        seeded = true;
    }
    if !seeded {
        return stats;
    }

    let shared = Arc::new(primary);
    for frame in frames.iter_mut() {
        if let RasterFrame::Indexed { palette, .. } = frame {
            *palette = Arc::clone(&shared);
        }
    }

    debug!(
        palette = shared.len(),
        appended = stats.appended,
        fallbacks = stats.fallbacks,
        "consolidated palettes"
    );
    stats
}

/// 每帧各自通过本地调色板解析为真彩色，帧之间没有依赖
pub fn upgrade(frames: Vec<RasterFrame>) -> Vec<RasterFrame> {
    frames
        .into_iter()
        .map(RasterFrame::into_true_color)
        .collect()
}

/// 分析、决策，然后合并调色板或升级为真彩色。
///
/// 只要有一帧是真彩色，整个序列都升级为真彩色。
pub fn resolve_color_space(
    mut frames: Vec<RasterFrame>,
    maintain_palette: bool,
) -> (Vec<RasterFrame>, ColorSpace) {
    if frames.iter().any(|f| !f.is_indexed()) {
        debug!("true color source frames, upgrading the whole sequence");
        return (upgrade(frames), ColorSpace::TrueColor);
    }

    let report = analyze(&frames);
    debug!(
        identical = report.identical_palettes,
        unique_colors = report.unique_colors,
        "analyzed palettes"
    );
    if report.identical_palettes {
        return (frames, ColorSpace::Paletted);
    }

    match decide(report.exceeds_capacity(), maintain_palette) {
        ColorSpace::TrueColor => (upgrade(frames), ColorSpace::TrueColor),
        ColorSpace::Paletted => {
            consolidate(&mut frames);
            (frames, ColorSpace::Paletted)
        }
    }
}

use std::sync::Arc;

/// 8 位 RGBA 颜色
pub type Rgba = rgb::RGBA8;

/// 调色板最多容纳的颜色数量
pub const PALETTE_CAPACITY: usize = 256;

/// 完全透明的黑色，越界索引和画布填充都解析为它
pub const TRANSPARENT: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
};

/// 颜色写入调色板后的落点
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Placement {
    /// 调色板中已有完全相同的颜色
    Exact(u8),
    /// 追加到调色板末尾
    Appended(u8),
    /// 调色板已满，退化为最接近的颜色
    Nearest(u8),
}

impl Placement {
    pub fn index(self) -> u8 {
        match self {
            Placement::Exact(index) | Placement::Appended(index) | Placement::Nearest(index) => {
                index
            }
        }
    }
}

/// 有序调色板，颜色的位置就是像素引用的索引
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Palette {
    colors: Vec<Rgba>,
}

impl Palette {
    pub fn new(colors: Vec<Rgba>) -> Palette {
        Palette { colors }
    }

    /// 由 `r,g,b` 三元组构造，`transparent` 指定的索引 alpha 为 0（GIF 的透明色）
    pub fn from_rgb(rgb: &[u8], transparent: Option<u8>) -> Palette {
        let colors = rgb
            .chunks_exact(3)
            .take(PALETTE_CAPACITY)
            .enumerate()
            .map(|(index, c)| {
                let a = if transparent == Some(index as u8) { 0 } else { 255 };
                Rgba::new(c[0], c[1], c[2], a)
            })
            .collect();
        Palette { colors }
    }

    /// 由 PNG 的 PLTE 与 tRNS 数据构造，tRNS 可以比 PLTE 短
    pub fn from_plte(plte: &[u8], trns: Option<&[u8]>) -> Palette {
        let trns = trns.unwrap_or(&[]);
        let colors = plte
            .chunks_exact(3)
            .take(PALETTE_CAPACITY)
            .enumerate()
            .map(|(index, c)| Rgba::new(c[0], c[1], c[2], trns.get(index).copied().unwrap_or(255)))
            .collect();
        Palette { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_full(&self) -> bool {
        self.colors.len() >= PALETTE_CAPACITY
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// 解析索引，越界索引视为透明
    pub fn resolve(&self, index: u8) -> Rgba {
        self.colors
            .get(index as usize)
            .copied()
            .unwrap_or(TRANSPARENT)
    }

    /// 按插入顺序查找完全相同的颜色
    pub fn position(&self, color: Rgba) -> Option<u8> {
        self.colors
            .iter()
            .position(|c| *c == color)
            .map(|index| index as u8)
    }

    /// 平方欧氏距离最小的颜色，距离相同时取索引较小者
    pub fn nearest(&self, color: Rgba) -> Option<u8> {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| distance(**c, color))
            .map(|(index, _)| index as u8)
    }

    /// 精确匹配，否则追加，调色板已满时取最近色
    pub fn place(&mut self, color: Rgba) -> Placement {
        if let Some(index) = self.position(color) {
            return Placement::Exact(index);
        }
        if !self.is_full() {
            self.colors.push(color);
            return Placement::Appended((self.colors.len() - 1) as u8);
        }
        // 已满的调色板必然非空
        Placement::Nearest(self.nearest(color).unwrap_or(0))
    }

    /// 依次写入另一个调色板的每个颜色，返回本地索引对应的落点
    pub fn absorb(&mut self, local: &Palette) -> Vec<Placement> {
        local.colors.iter().map(|&color| self.place(color)).collect()
    }

    /// PLTE 数据
    pub fn rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// tRNS 数据，所有颜色都不透明时返回 `None`
    pub fn trns_bytes(&self) -> Option<Vec<u8>> {
        let last = self.colors.iter().rposition(|c| c.a != 255)?;
        Some(self.colors[..=last].iter().map(|c| c.a).collect())
    }
}

/// RGBA 各通道差值的平方和
pub fn distance(a: Rgba, b: Rgba) -> u32 {
    let channel = |x: u8, y: u8| {
        let d = x as i32 - y as i32;
        (d * d) as u32
    };
    channel(a.r, b.r) + channel(a.g, b.g) + channel(a.b, b.b) + channel(a.a, b.a)
}

/// 解码后的一帧图像，索引色或真彩色
#[derive(Clone, Debug, PartialEq)]
pub enum RasterFrame {
    Indexed {
        width: u32,
        height: u32,
        palette: Arc<Palette>,
        indices: Vec<u8>,
    },
    TrueColor {
        width: u32,
        height: u32,
        pixels: Vec<Rgba>,
    },
}

impl RasterFrame {
    pub fn indexed(width: u32, height: u32, palette: Palette, indices: Vec<u8>) -> RasterFrame {
        RasterFrame::Indexed {
            width,
            height,
            palette: Arc::new(palette),
            indices,
        }
    }

    pub fn true_color(width: u32, height: u32, pixels: Vec<Rgba>) -> RasterFrame {
        RasterFrame::TrueColor {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            RasterFrame::Indexed { width, .. } | RasterFrame::TrueColor { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            RasterFrame::Indexed { height, .. } | RasterFrame::TrueColor { height, .. } => *height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, RasterFrame::Indexed { .. })
    }

    pub fn palette(&self) -> Option<&Arc<Palette>> {
        match self {
            RasterFrame::Indexed { palette, .. } => Some(palette),
            RasterFrame::TrueColor { .. } => None,
        }
    }

    /// 统一的像素访问，坐标越界返回 `None`
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let offset = y as usize * self.width() as usize + x as usize;
        match self {
            RasterFrame::Indexed {
                palette, indices, ..
            } => indices.get(offset).map(|&index| palette.resolve(index)),
            RasterFrame::TrueColor { pixels, .. } => pixels.get(offset).copied(),
        }
    }

    /// 逐像素解析为 RGBA
    pub fn to_rgba(&self) -> Vec<Rgba> {
        match self {
            RasterFrame::Indexed {
                palette, indices, ..
            } => indices.iter().map(|&index| palette.resolve(index)).collect(),
            RasterFrame::TrueColor { pixels, .. } => pixels.clone(),
        }
    }

    /// 通过帧自己的调色板转换为真彩色，无损
    pub fn into_true_color(self) -> RasterFrame {
        match self {
            RasterFrame::Indexed {
                width,
                height,
                palette,
                indices,
            } => RasterFrame::TrueColor {
                width,
                height,
                pixels: indices.iter().map(|&index| palette.resolve(index)).collect(),
            },
            true_color => true_color,
        }
    }

    /// 把帧放到 `canvas_width x canvas_height` 的透明画布的 `(left, top)` 处，超出画布的部分被裁掉。
    ///
    /// 索引帧的调色板先去掉重复颜色再按 [`Palette::place`] 加入透明色；
    /// 调色板仍然容不下透明色时，这一帧改为真彩色。
    pub fn pad_to_canvas(
        self,
        canvas_width: u32,
        canvas_height: u32,
        left: u32,
        top: u32,
    ) -> RasterFrame {
        if self.dimensions() == (canvas_width, canvas_height) && left == 0 && top == 0 {
            return self;
        }
        match self {
            RasterFrame::Indexed {
                width,
                height,
                palette,
                indices,
            } => {
                let mut compact = Palette::default();
                let placements = compact.absorb(&palette);
                let fill = match compact.place(TRANSPARENT) {
                    Placement::Nearest(_) => {
                        return RasterFrame::Indexed {
                            width,
                            height,
                            palette,
                            indices,
                        }
                        .into_true_color()
                        .pad_to_canvas(canvas_width, canvas_height, left, top);
                    }
                    placement => placement.index(),
                };
                let remapped: Vec<u8> = indices
                    .iter()
                    .map(|&index| placements.get(index as usize).map_or(fill, |p| p.index()))
                    .collect();
                RasterFrame::Indexed {
                    width: canvas_width,
                    height: canvas_height,
                    palette: Arc::new(compact),
                    indices: blit(
                        &remapped,
                        width,
                        height,
                        fill,
                        canvas_width,
                        canvas_height,
                        left,
                        top,
                    ),
                }
            }
            RasterFrame::TrueColor {
                width,
                height,
                pixels,
            } => RasterFrame::TrueColor {
                width: canvas_width,
                height: canvas_height,
                pixels: blit(
                    &pixels,
                    width,
                    height,
                    TRANSPARENT,
                    canvas_width,
                    canvas_height,
                    left,
                    top,
                ),
            },
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn blit<T: Copy>(
    source: &[T],
    width: u32,
    height: u32,
    fill: T,
    canvas_width: u32,
    canvas_height: u32,
    left: u32,
    top: u32,
) -> Vec<T> {
    let mut canvas = vec![fill; canvas_width as usize * canvas_height as usize];
    let visible_width = width.min(canvas_width.saturating_sub(left)) as usize;
    let visible_height = height.min(canvas_height.saturating_sub(top));
    for row in 0..visible_height {
        let from = row as usize * width as usize;
        let to = (top + row) as usize * canvas_width as usize + left as usize;
        if let Some(line) = source.get(from..from + visible_width) {
            canvas[to..to + visible_width].copy_from_slice(line);
        }
    }
    canvas
}

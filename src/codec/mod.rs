pub mod apng;
pub mod gif_reader;
pub mod still;

use std::sync::Arc;

use crate::animation::{Palette, RasterFrame, Rgba};

/// PNG 的像素布局：所有帧共享同一调色板时写索引色，否则写 RGBA8
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PixelLayout {
    Indexed(Arc<Palette>),
    Rgba,
}

impl PixelLayout {
    pub(crate) fn of<'a>(mut images: impl Iterator<Item = &'a RasterFrame>) -> PixelLayout {
        let Some(first) = images.next() else {
            return PixelLayout::Rgba;
        };
        let Some(palette) = first.palette() else {
            return PixelLayout::Rgba;
        };
        if images.all(|image| image.palette().map_or(false, |p| p == palette)) {
            PixelLayout::Indexed(Arc::clone(palette))
        } else {
            PixelLayout::Rgba
        }
    }

    pub(crate) fn color_type(&self) -> png::ColorType {
        match self {
            PixelLayout::Indexed(_) => png::ColorType::Indexed,
            PixelLayout::Rgba => png::ColorType::Rgba,
        }
    }

    /// 写入 PLTE、tRNS 与颜色模式
    pub(crate) fn configure<W: std::io::Write>(&self, encoder: &mut png::Encoder<'_, W>) {
        encoder.set_color(self.color_type());
        encoder.set_depth(png::BitDepth::Eight);
        if let PixelLayout::Indexed(palette) = self {
            encoder.set_palette(palette.rgb_bytes());
            if let Some(trns) = palette.trns_bytes() {
                encoder.set_trns(trns);
            }
        }
    }

    /// 图像数据，每像素 1 或 4 字节
    pub(crate) fn image_data(&self, image: &RasterFrame) -> Vec<u8> {
        match (self, image) {
            (PixelLayout::Indexed(_), RasterFrame::Indexed { indices, .. }) => indices.clone(),
            _ => rgba_bytes(&image.to_rgba()),
        }
    }
}

fn rgba_bytes(pixels: &[Rgba]) -> Vec<u8> {
    pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
}

/// 把解码器输出的 8 位像素转换为 RGBA
pub(crate) fn to_rgba(color_type: png::ColorType, bytes: &[u8]) -> Option<Vec<Rgba>> {
    let pixels = match color_type {
        png::ColorType::Grayscale => bytes.iter().map(|&v| Rgba::new(v, v, v, 255)).collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .map(|p| Rgba::new(p[0], p[0], p[0], p[1]))
            .collect(),
        png::ColorType::Rgb => rgb::FromSlice::as_rgb(bytes)
            .iter()
            .map(|p| Rgba::new(p.r, p.g, p.b, 255))
            .collect(),
        png::ColorType::Rgba => rgb::FromSlice::as_rgba(bytes).to_vec(),
        png::ColorType::Indexed => return None,
    };
    Some(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_is_indexed_only_for_one_shared_palette() {
        let palette = Palette::new(vec![Rgba::new(1, 2, 3, 255)]);
        let a = RasterFrame::indexed(1, 1, palette.clone(), vec![0]);
        let b = RasterFrame::indexed(1, 1, palette, vec![0]);
        let other = RasterFrame::indexed(1, 1, Palette::new(vec![Rgba::new(9, 9, 9, 255)]), vec![0]);
        let true_color = RasterFrame::true_color(1, 1, vec![Rgba::new(1, 2, 3, 255)]);

        assert!(matches!(PixelLayout::of([&a, &b].into_iter()), PixelLayout::Indexed(_)));
        assert_eq!(PixelLayout::of([&a, &other].into_iter()), PixelLayout::Rgba);
        assert_eq!(PixelLayout::of([&a, &true_color].into_iter()), PixelLayout::Rgba);
    }

    #[test]
    fn decoder_output_expands_to_rgba() {
        assert_eq!(
            to_rgba(png::ColorType::GrayscaleAlpha, &[7, 8]),
            Some(vec![Rgba::new(7, 7, 7, 8)])
        );
        assert_eq!(
            to_rgba(png::ColorType::Rgb, &[1, 2, 3]),
            Some(vec![Rgba::new(1, 2, 3, 255)])
        );
        assert_eq!(to_rgba(png::ColorType::Indexed, &[0]), None);
    }
}

use gif::DisposalMethod;
use tracing::{debug, info};

use super::palette::{resolve_color_space, ColorSpace};
use super::{AnimationFrame, AnimationSequence, BlendOp, Delay, DisposeOp, RasterFrame};
use crate::codec::gif_reader::GifAnimation;
use crate::config::Settings;
use crate::error::{Error, Result};

/// 单帧对全局配置的覆盖，缺省项回落到 [`Settings`]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameOverrides {
    pub numerator: Option<u16>,
    pub denominator: Option<u16>,
    pub is_default: Option<bool>,
    pub dispose_op: Option<DisposeOp>,
    pub blend_op: Option<BlendOp>,
}

/// 一张静态图像及其覆盖项
#[derive(Clone, Debug)]
pub struct StillFrame {
    pub raster: RasterFrame,
    pub overrides: FrameOverrides,
}

impl StillFrame {
    pub fn new(raster: RasterFrame) -> StillFrame {
        StillFrame {
            raster,
            overrides: FrameOverrides::default(),
        }
    }
}

/// GIF 的处置方式映射，`Any`（未指定）按 `Background` 处理
pub fn dispose_from_gif(disposal: DisposalMethod) -> DisposeOp {
    match disposal {
        DisposalMethod::Keep => DisposeOp::None,
        DisposalMethod::Background => DisposeOp::Background,
        DisposalMethod::Previous => DisposeOp::Previous,
        DisposalMethod::Any => DisposeOp::Background,
    }
}

/// 把像素数据和逐帧元数据组装成 [`AnimationSequence`]
pub struct AnimationFrameBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> AnimationFrameBuilder<'a> {
    pub fn new(settings: &'a Settings) -> AnimationFrameBuilder<'a> {
        AnimationFrameBuilder { settings }
    }

    /// GIF 帧：延迟按百分之一秒原样保留，偏移取帧的左上角，统一使用 `Over` 合成。
    ///
    /// 第 0 帧会被铺到完整的逻辑屏幕上，APNG 要求首帧覆盖整个画布。
    pub fn from_gif(&self, gif: GifAnimation) -> Result<AnimationSequence> {
        let GifAnimation {
            width,
            height,
            loop_count,
            frames,
        } = gif;

        let mut rasters = Vec::with_capacity(frames.len());
        let mut metadata = Vec::with_capacity(frames.len());
        for (index, frame) in frames.into_iter().enumerate() {
            let (raster, x_offset, y_offset) = if index == 0 {
                let raster = frame.raster.pad_to_canvas(
                    width as u32,
                    height as u32,
                    frame.left as u32,
                    frame.top as u32,
                );
                (raster, 0, 0)
            } else {
                (frame.raster, frame.left as u32, frame.top as u32)
            };
            rasters.push(raster);
            metadata.push((x_offset, y_offset, frame.delay, frame.disposal));
        }

        let (rasters, space) = resolve_color_space(rasters, self.settings.maintain_palette);
        self.log_color_space(space, rasters.len());

        let frames = rasters
            .into_iter()
            .zip(metadata)
            .enumerate()
            .map(
                |(index, (image, (x_offset, y_offset, delay, disposal)))| AnimationFrame {
                    image,
                    x_offset,
                    y_offset,
                    delay: Delay::from_centiseconds(delay),
                    dispose_op: dispose_from_gif(disposal),
                    blend_op: BlendOp::Over,
                    is_default: index == 0 && self.settings.default_image,
                },
            )
            .collect();

        AnimationSequence::new(loop_count, frames)
    }

    /// 静态图像组成的动画，全部位于画布原点，画布取第 0 帧尺寸
    pub fn from_stills(&self, stills: Vec<StillFrame>) -> Result<AnimationSequence> {
        let canvas = match stills.first() {
            Some(first) => first.raster.dimensions(),
            None => return Err(Error::config("no frames to animate")),
        };

        let mut rasters = Vec::with_capacity(stills.len());
        let mut timings = Vec::with_capacity(stills.len());
        for (index, still) in stills.into_iter().enumerate() {
            let (width, height) = still.raster.dimensions();
            if width > canvas.0 || height > canvas.1 {
                return Err(Error::config(format!(
                    "frame {} ({}x{}) is larger than the {}x{} canvas",
                    index, width, height, canvas.0, canvas.1
                )));
            }
            timings.push(self.resolve(index, &still.overrides)?);
            rasters.push(still.raster);
        }

        let (rasters, space) = resolve_color_space(rasters, self.settings.maintain_palette);
        self.log_color_space(space, rasters.len());

        let frames = rasters
            .into_iter()
            .zip(timings)
            .map(
                |(image, (delay, dispose_op, blend_op, is_default))| AnimationFrame {
                    image,
                    x_offset: 0,
                    y_offset: 0,
                    delay,
                    dispose_op,
                    blend_op,
                    is_default,
                },
            )
            .collect();

        AnimationSequence::new(self.settings.loop_count, frames)
    }

    /// 合并覆盖项与全局配置
    fn resolve(
        &self,
        index: usize,
        overrides: &FrameOverrides,
    ) -> Result<(Delay, DisposeOp, BlendOp, bool)> {
        let delay = Delay::new(
            overrides.numerator.unwrap_or(self.settings.delay.numerator),
            overrides
                .denominator
                .unwrap_or(self.settings.delay.denominator),
        )?;
        let is_default = overrides
            .is_default
            .unwrap_or(index == 0 && self.settings.default_image);
        if is_default && index != 0 {
            return Err(Error::config(format!(
                "frame {} cannot be the default image, only the first frame can",
                index
            )));
        }
        Ok((
            delay,
            overrides.dispose_op.unwrap_or(self.settings.dispose_op),
            overrides.blend_op.unwrap_or(self.settings.blend_op),
            is_default,
        ))
    }

    fn log_color_space(&self, space: ColorSpace, frames: usize) {
        match space {
            ColorSpace::Paletted => debug!(frames, "writing paletted frames"),
            ColorSpace::TrueColor => info!(frames, "too many colors for one palette, writing true color"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Palette, Rgba};
    use crate::codec::gif_reader::GifFrame;
    use pretty_assertions::assert_eq;

    fn indexed(width: u32, height: u32, colors: &[Rgba]) -> RasterFrame {
        RasterFrame::indexed(
            width,
            height,
            Palette::new(colors.to_vec()),
            vec![0; (width * height) as usize],
        )
    }

    fn gif_frame(raster: RasterFrame, left: u16, top: u16, disposal: DisposalMethod) -> GifFrame {
        GifFrame {
            raster,
            left,
            top,
            delay: 4,
            disposal,
        }
    }

    #[test]
    fn disposal_mapping() {
        assert_eq!(dispose_from_gif(DisposalMethod::Keep), DisposeOp::None);
        assert_eq!(dispose_from_gif(DisposalMethod::Background), DisposeOp::Background);
        assert_eq!(dispose_from_gif(DisposalMethod::Previous), DisposeOp::Previous);
        assert_eq!(dispose_from_gif(DisposalMethod::Any), DisposeOp::Background);
    }

    #[test]
    fn gif_frames_blend_over_with_exact_delay_and_offsets() {
        let red = Rgba::new(255, 0, 0, 255);
        let blue = Rgba::new(0, 0, 255, 255);
        let gif = GifAnimation {
            width: 4,
            height: 4,
            loop_count: 0,
            frames: vec![
                gif_frame(indexed(4, 4, &[red]), 0, 0, DisposalMethod::Any),
                gif_frame(indexed(2, 2, &[blue]), 1, 2, DisposalMethod::Keep),
            ],
        };
        let settings = Settings::default();
        let sequence = AnimationFrameBuilder::new(&settings).from_gif(gif).unwrap();

        let frames = sequence.frames();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.blend_op == BlendOp::Over));
        assert!(frames.iter().all(|f| f.delay == Delay::from_centiseconds(4)));
        assert_eq!((frames[1].x_offset, frames[1].y_offset), (1, 2));
        assert_eq!(frames[0].dispose_op, DisposeOp::Background);
        assert_eq!(frames[1].dispose_op, DisposeOp::None);
        // 调色板已合并为 [red, blue]
        assert_eq!(frames[1].image.palette().unwrap().colors(), &[red, blue]);
        assert_eq!(frames[1].image.pixel(0, 0), Some(blue));
    }

    #[test]
    fn first_gif_frame_is_padded_to_the_screen() {
        let red = Rgba::new(255, 0, 0, 255);
        let gif = GifAnimation {
            width: 3,
            height: 2,
            loop_count: 2,
            frames: vec![gif_frame(indexed(1, 1, &[red]), 2, 1, DisposalMethod::Any)],
        };
        let settings = Settings::default();
        let sequence = AnimationFrameBuilder::new(&settings).from_gif(gif).unwrap();
        let first = &sequence.frames()[0];
        assert_eq!(sequence.loop_count(), 2);
        assert_eq!(first.image.dimensions(), (3, 2));
        assert_eq!((first.x_offset, first.y_offset), (0, 0));
        assert_eq!(first.image.pixel(2, 1), Some(red));
        assert_eq!(first.image.pixel(0, 0).map(|c| c.a), Some(0));
    }

    #[test]
    fn padded_gif_color_tables_keep_every_color() {
        // 颜色表补齐到 2 的幂，末尾是重复的黑色
        let table = |offset: u8, count: u8, size: usize| {
            let mut colors: Vec<Rgba> = (0..count).map(|n| Rgba::new(offset + n, 9, 9, 255)).collect();
            colors.resize(size, Rgba::new(0, 0, 0, 255));
            Palette::new(colors)
        };
        let first = RasterFrame::indexed(13, 10, table(0, 130, 256), (0..130).collect());
        let second = RasterFrame::indexed(10, 10, table(130, 100, 128), (0..100).collect());
        let expected = second.to_rgba();
        let gif = GifAnimation {
            width: 14,
            height: 10,
            loop_count: 0,
            frames: vec![
                gif_frame(first, 0, 0, DisposalMethod::Keep),
                gif_frame(second, 2, 0, DisposalMethod::Keep),
            ],
        };
        let settings = Settings::default();
        let sequence = AnimationFrameBuilder::new(&settings).from_gif(gif).unwrap();

        let frames = sequence.frames();
        assert!(frames.iter().all(|f| f.image.is_indexed()));
        assert_eq!(frames[1].image.to_rgba(), expected);
        assert_eq!(frames[0].image.pixel(13, 0), Some(crate::animation::TRANSPARENT));
    }

    #[test]
    fn stills_use_global_defaults_and_overrides() {
        let black = Rgba::new(0, 0, 0, 255);
        let settings = Settings {
            delay: Delay::new(3, 30).unwrap(),
            dispose_op: DisposeOp::Previous,
            default_image: true,
            loop_count: 5,
            ..Settings::default()
        };
        let mut second = StillFrame::new(indexed(2, 2, &[black]));
        second.overrides = FrameOverrides {
            numerator: Some(1),
            blend_op: Some(BlendOp::Over),
            ..FrameOverrides::default()
        };
        let stills = vec![StillFrame::new(indexed(2, 2, &[black])), second];

        let sequence = AnimationFrameBuilder::new(&settings).from_stills(stills).unwrap();
        let frames = sequence.frames();
        assert_eq!(sequence.loop_count(), 5);
        assert!(frames[0].is_default);
        assert!(!frames[1].is_default);
        assert_eq!(sequence.animated_len(), 1);
        assert_eq!(frames[0].delay, Delay::new(3, 30).unwrap());
        assert_eq!(frames[1].delay, Delay::new(1, 30).unwrap());
        assert_eq!(frames[1].dispose_op, DisposeOp::Previous);
        assert_eq!(frames[0].blend_op, BlendOp::Source);
        assert_eq!(frames[1].blend_op, BlendOp::Over);
    }

    #[test]
    fn zero_denominator_override_is_rejected() {
        let settings = Settings::default();
        let mut still = StillFrame::new(indexed(1, 1, &[Rgba::new(0, 0, 0, 255)]));
        still.overrides.denominator = Some(0);
        let result = AnimationFrameBuilder::new(&settings).from_stills(vec![still]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn default_override_on_later_frame_is_rejected() {
        let settings = Settings::default();
        let first = StillFrame::new(indexed(1, 1, &[Rgba::new(0, 0, 0, 255)]));
        let mut second = first.clone();
        second.overrides.is_default = Some(true);
        let result = AnimationFrameBuilder::new(&settings).from_stills(vec![first, second]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn oversized_still_is_rejected() {
        let settings = Settings::default();
        let black = [Rgba::new(0, 0, 0, 255)];
        let stills = vec![
            StillFrame::new(indexed(1, 1, &black)),
            StillFrame::new(indexed(2, 1, &black)),
        ];
        assert!(AnimationFrameBuilder::new(&settings).from_stills(stills).is_err());
        assert!(AnimationFrameBuilder::new(&settings).from_stills(vec![]).is_err());
    }
}

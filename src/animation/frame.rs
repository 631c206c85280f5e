use std::fmt;

use super::RasterFrame;
use crate::error::{Error, Result};

/// 绘制下一帧前如何重置画布
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DisposeOp {
    None,
    #[default]
    Background,
    Previous,
}

impl DisposeOp {
    /// 无法识别的名称按 `Background` 处理
    pub fn from_name(name: &str) -> DisposeOp {
        match name.to_ascii_lowercase().as_str() {
            "none" => DisposeOp::None,
            "previous" => DisposeOp::Previous,
            _ => DisposeOp::Background,
        }
    }
}

impl fmt::Display for DisposeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisposeOp::None => "None",
            DisposeOp::Background => "Background",
            DisposeOp::Previous => "Previous",
        })
    }
}

impl From<DisposeOp> for png::DisposeOp {
    fn from(op: DisposeOp) -> png::DisposeOp {
        match op {
            DisposeOp::None => png::DisposeOp::None,
            DisposeOp::Background => png::DisposeOp::Background,
            DisposeOp::Previous => png::DisposeOp::Previous,
        }
    }
}

impl From<png::DisposeOp> for DisposeOp {
    fn from(op: png::DisposeOp) -> DisposeOp {
        match op {
            png::DisposeOp::None => DisposeOp::None,
            png::DisposeOp::Background => DisposeOp::Background,
            png::DisposeOp::Previous => DisposeOp::Previous,
        }
    }
}

/// 帧像素与画布的合成方式
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BlendOp {
    #[default]
    Source,
    Over,
}

impl BlendOp {
    /// 只有 `over` 会开启合成
    pub fn from_name(name: &str) -> BlendOp {
        if name.eq_ignore_ascii_case("over") {
            BlendOp::Over
        } else {
            BlendOp::Source
        }
    }
}

impl fmt::Display for BlendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlendOp::Source => "Source",
            BlendOp::Over => "Over",
        })
    }
}

impl From<BlendOp> for png::BlendOp {
    fn from(op: BlendOp) -> png::BlendOp {
        match op {
            BlendOp::Source => png::BlendOp::Source,
            BlendOp::Over => png::BlendOp::Over,
        }
    }
}

impl From<png::BlendOp> for BlendOp {
    fn from(op: png::BlendOp) -> BlendOp {
        match op {
            png::BlendOp::Source => BlendOp::Source,
            png::BlendOp::Over => BlendOp::Over,
        }
    }
}

/// 帧延迟，`numerator / denominator` 秒
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Delay {
    pub numerator: u16,
    pub denominator: u16,
}

impl Delay {
    /// 配置中的延迟，分母为 0 时报错
    pub fn new(numerator: u16, denominator: u16) -> Result<Delay> {
        if denominator == 0 {
            return Err(Error::config(format!(
                "delay denominator must be nonzero (got {}/{})",
                numerator, denominator
            )));
        }
        Ok(Delay {
            numerator,
            denominator,
        })
    }

    /// GIF 的百分之一秒直接作为分子，不做取整
    pub fn from_centiseconds(centiseconds: u16) -> Delay {
        Delay {
            numerator: centiseconds,
            denominator: 100,
        }
    }

    /// 延迟秒数，APNG 中分母为 0 表示 100
    pub fn seconds(&self) -> f64 {
        let denominator = if self.denominator == 0 {
            100
        } else {
            self.denominator
        };
        self.numerator as f64 / denominator as f64
    }
}

impl Default for Delay {
    fn default() -> Delay {
        Delay {
            numerator: 1,
            denominator: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub image: RasterFrame,
    pub x_offset: u32,
    pub y_offset: u32,
    pub delay: Delay,
    pub dispose_op: DisposeOp,
    pub blend_op: BlendOp,
    /// 只能用于第 0 帧，作为静态回退图像，不计入动画
    pub is_default: bool,
}

impl AnimationFrame {
    pub fn new(image: RasterFrame) -> AnimationFrame {
        AnimationFrame {
            image,
            x_offset: 0,
            y_offset: 0,
            delay: Delay::default(),
            dispose_op: DisposeOp::default(),
            blend_op: BlendOp::default(),
            is_default: false,
        }
    }
}

/// 完整的动画，构造后不再修改，交给编码器一次性消费
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSequence {
    loop_count: u32,
    frames: Vec<AnimationFrame>,
}

impl AnimationSequence {
    /// `loop_count` 为 0 表示无限循环。
    ///
    /// 除默认图像外至少需要一帧，且只有第 0 帧可以是默认图像。
    pub fn new(loop_count: u32, frames: Vec<AnimationFrame>) -> Result<AnimationSequence> {
        if let Some(index) = frames.iter().skip(1).position(|f| f.is_default) {
            return Err(Error::config(format!(
                "only the first frame may be the default image (frame {} is marked)",
                index + 1
            )));
        }
        let sequence = AnimationSequence { loop_count, frames };
        if sequence.animated_len() == 0 {
            return Err(Error::config(
                "an animation needs at least one frame besides the default image",
            ));
        }
        Ok(sequence)
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn has_default_image(&self) -> bool {
        self.frames.first().map_or(false, |f| f.is_default)
    }

    /// 动画循环中的帧数，不含默认图像
    pub fn animated_len(&self) -> usize {
        self.frames.len() - usize::from(self.has_default_image())
    }

    /// 画布尺寸取第 0 帧的尺寸
    pub fn canvas(&self) -> (u32, u32) {
        self.frames
            .first()
            .map_or((0, 0), |f| f.image.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Palette, Rgba};

    fn frame() -> AnimationFrame {
        AnimationFrame::new(RasterFrame::indexed(
            1,
            1,
            Palette::new(vec![Rgba::new(0, 0, 0, 255)]),
            vec![0],
        ))
    }

    #[test]
    fn zero_denominator_is_rejected() {
        assert!(matches!(Delay::new(1, 0), Err(Error::Config(_))));
        assert_eq!(Delay::new(3, 4).unwrap().seconds(), 0.75);
    }

    #[test]
    fn centiseconds_keep_exact_timing() {
        let delay = Delay::from_centiseconds(7);
        assert_eq!((delay.numerator, delay.denominator), (7, 100));
    }

    #[test]
    fn decoded_zero_denominator_reads_as_hundredths() {
        let delay = Delay {
            numerator: 50,
            denominator: 0,
        };
        assert_eq!(delay.seconds(), 0.5);
    }

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(DisposeOp::from_name("previous"), DisposeOp::Previous);
        assert_eq!(DisposeOp::from_name("NONE"), DisposeOp::None);
        assert_eq!(DisposeOp::from_name("sideways"), DisposeOp::Background);
        assert_eq!(BlendOp::from_name("over"), BlendOp::Over);
        assert_eq!(BlendOp::from_name("under"), BlendOp::Source);
    }

    #[test]
    fn default_image_is_excluded_from_loop_length() {
        let mut first = frame();
        first.is_default = true;
        let sequence = AnimationSequence::new(0, vec![first, frame(), frame()]).unwrap();
        assert!(sequence.has_default_image());
        assert_eq!(sequence.frames().len(), 3);
        assert_eq!(sequence.animated_len(), 2);
    }

    #[test]
    fn default_flag_after_first_frame_is_rejected() {
        let mut second = frame();
        second.is_default = true;
        assert!(matches!(
            AnimationSequence::new(0, vec![frame(), second]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn default_image_alone_is_rejected() {
        let mut only = frame();
        only.is_default = true;
        assert!(AnimationSequence::new(0, vec![only]).is_err());
        assert!(AnimationSequence::new(0, vec![]).is_err());
    }
}

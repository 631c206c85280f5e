use std::path::PathBuf;

use crate::animation::{BlendOp, Delay, DisposeOp};
use crate::error::{Error, Result};

/// 一次调用的全部配置，构造后只读，显式传入每个阶段
#[derive(Clone, Debug)]
pub struct Settings {
    /// 未单独指定时每帧的延迟
    pub delay: Delay,
    pub dispose_op: DisposeOp,
    pub blend_op: BlendOp,
    /// 0 表示无限循环
    pub loop_count: u32,
    /// 第 0 帧作为默认图像
    pub default_image: bool,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 提取帧的起始编号
    pub start: usize,
    /// 提取帧文件名的补零宽度
    pub padding: Option<usize>,
    /// 默认图像参与编号而不是命名为 `default.png`
    pub number_default: bool,
    /// 超过 256 色时仍保持调色板模式
    pub maintain_palette: bool,
    /// 批量处理的并行线程数
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            delay: Delay::default(),
            dispose_op: DisposeOp::Background,
            blend_op: BlendOp::Source,
            loop_count: 0,
            default_image: false,
            output_dir: PathBuf::from("."),
            start: 0,
            padding: None,
            number_default: false,
            maintain_palette: false,
            jobs: 1,
        }
    }
}

impl Settings {
    pub fn validate(self) -> Result<Settings> {
        Delay::new(self.delay.numerator, self.delay.denominator)?;
        if self.jobs == 0 {
            return Err(Error::config("jobs must be at least 1"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default().validate().unwrap();
        assert_eq!(settings.delay, Delay::default());
        assert_eq!(settings.dispose_op, DisposeOp::Background);
    }

    #[test]
    fn zero_denominator_and_zero_jobs_are_rejected() {
        let settings = Settings {
            delay: Delay {
                numerator: 1,
                denominator: 0,
            },
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));

        let settings = Settings {
            jobs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}

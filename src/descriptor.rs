//! `animate` 使用的 JSON 帧描述文件。
//!
//! ```json
//! [
//!   { "image": "idle.png", "default": true },
//!   { "image": "walk-1.png", "numerator": 1, "denominator": 12, "dispose": "none" },
//!   { "image": "walk-2.png", "blend": "over" }
//! ]
//! ```
//!
//! 图像路径相对于描述文件所在目录，缺省的字段回落到命令行的全局配置。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::animation::{BlendOp, DisposeOp, FrameOverrides};
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FrameDescriptor {
    /// 必填，缺少时在 [`Descriptor::entries`] 中报错
    pub image: Option<PathBuf>,
    pub numerator: Option<u16>,
    pub denominator: Option<u16>,
    #[serde(rename = "default")]
    pub is_default: Option<bool>,
    pub dispose: Option<String>,
    pub blend: Option<String>,
}

impl FrameDescriptor {
    fn overrides(&self) -> FrameOverrides {
        FrameOverrides {
            numerator: self.numerator,
            denominator: self.denominator,
            is_default: self.is_default,
            dispose_op: self.dispose.as_deref().map(DisposeOp::from_name),
            blend_op: self.blend.as_deref().map(BlendOp::from_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    /// 相对路径的基准目录
    base: PathBuf,
    frames: Vec<FrameDescriptor>,
}

impl Descriptor {
    pub fn read(path: &Path) -> Result<Descriptor> {
        let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Descriptor::parse(&text, base, path)
    }

    pub fn parse(text: &str, base: PathBuf, path: &Path) -> Result<Descriptor> {
        let frames = serde_json::from_str(text).map_err(|source| Error::Descriptor {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Descriptor { base, frames })
    }

    /// 按顺序给出每帧的图像路径与覆盖项
    pub fn entries(&self) -> Result<Vec<(PathBuf, FrameOverrides)>> {
        self.frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let image = frame.image.as_ref().ok_or_else(|| {
                    Error::config(format!(
                        "frame descriptor {} is missing its image reference",
                        index
                    ))
                })?;
                Ok((self.base.join(image), frame.overrides()))
            })
            .collect()
    }
}

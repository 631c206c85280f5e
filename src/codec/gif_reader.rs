use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use gif::{ColorOutput, DecodeOptions, DisposalMethod, Repeat};
use tracing::debug;

use crate::animation::{Palette, RasterFrame};
use crate::error::{Error, Result};

/// GIF 中的一帧，像素保持索引形式
#[derive(Clone, Debug)]
pub struct GifFrame {
    pub raster: RasterFrame,
    pub left: u16,
    pub top: u16,
    /// 百分之一秒
    pub delay: u16,
    pub disposal: DisposalMethod,
}

#[derive(Clone, Debug)]
pub struct GifAnimation {
    /// 逻辑屏幕尺寸
    pub width: u16,
    pub height: u16,
    /// APNG 语义的播放次数，0 表示无限
    pub loop_count: u32,
    pub frames: Vec<GifFrame>,
}

pub fn read(path: &Path) -> Result<GifAnimation> {
    let file = File::open(path).map_err(|source| Error::io(path, source))?;
    decode(BufReader::new(file), path)
}

/// 解码整个 GIF，`path` 只用于错误信息
pub fn decode<R: Read>(reader: R, path: &Path) -> Result<GifAnimation> {
    let decoding = |source: gif::DecodingError| Error::GifDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let mut decoder = options.read_info(reader).map_err(decoding)?;

    let width = decoder.width();
    let height = decoder.height();
    let global_palette = decoder.global_palette().map(|p| p.to_vec());

    let mut frames = vec![];
    while let Some(frame) = decoder.read_next_frame().map_err(decoding)? {
        let rgb = frame
            .palette
            .as_deref()
            .or(global_palette.as_deref())
            .unwrap_or(&[]);
        let palette = Palette::from_rgb(rgb, frame.transparent);
        debug!(
            index = frames.len(),
            width = frame.width,
            height = frame.height,
            colors = palette.len(),
            "decoded GIF frame"
        );
        frames.push(GifFrame {
            raster: RasterFrame::indexed(
                frame.width as u32,
                frame.height as u32,
                palette,
                frame.buffer.to_vec(),
            ),
            left: frame.left,
            top: frame.top,
            delay: frame.delay,
            disposal: frame.dispose,
        });
    }

    // NETSCAPE 扩展的计数是额外重复次数，没有扩展时只播放一次
    let loop_count = match decoder.repeat() {
        Repeat::Infinite => 0,
        Repeat::Finite(repeats) => u32::from(repeats) + 1,
    };

    Ok(GifAnimation {
        width,
        height,
        loop_count,
        frames,
    })
}

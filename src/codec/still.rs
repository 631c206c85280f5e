use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use png::{BitDepth, ColorType, Decoder, Transformations};

use super::{to_rgba, PixelLayout};
use crate::animation::{Palette, RasterFrame};
use crate::error::{Error, Result};

/// 读取一张静态 PNG，APNG 只取第一张图像
pub fn read(path: &Path) -> Result<RasterFrame> {
    let data = fs::read(path).map_err(|source| Error::io(path, source))?;
    decode(&data, path)
}

/// 8 位索引色保持索引形式，其余颜色模式统一展开为 RGBA
pub fn decode(data: &[u8], path: &Path) -> Result<RasterFrame> {
    let decoding = |source: png::DecodingError| Error::PngDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(data);
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(decoding)?;
    let info = reader.info();

    if info.color_type == ColorType::Indexed && info.bit_depth == BitDepth::Eight {
        let palette = Palette::from_plte(
            info.palette.as_deref().unwrap_or(&[]),
            info.trns.as_deref(),
        );
        let mut buf = vec![0; reader.output_buffer_size()];
        let output = reader.next_frame(&mut buf).map_err(decoding)?;
        buf.truncate(output.buffer_size());
        return Ok(RasterFrame::indexed(output.width, output.height, palette, buf));
    }

    // 其他位深的索引色、灰度与 16 位图像都先展开为 8 位
    let mut decoder = Decoder::new(data);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decoding)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let output = reader.next_frame(&mut buf).map_err(decoding)?;
    let pixels = to_rgba(output.color_type, &buf[..output.buffer_size()])
        .ok_or(Error::UnsupportedColorMode(output.color_type))?;
    Ok(RasterFrame::true_color(output.width, output.height, pixels))
}

/// 把一帧写成独立的 PNG
pub fn write(path: &Path, image: &RasterFrame) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::io(path, source))?;
    let mut w = BufWriter::new(file);
    encode(&mut w, image, path)?;
    w.flush().map_err(|source| Error::io(path, source))
}

pub fn encode<W: Write>(w: W, image: &RasterFrame, path: &Path) -> Result<()> {
    let encoding = |source: png::EncodingError| Error::PngEncode {
        path: path.to_path_buf(),
        source,
    };

    let layout = PixelLayout::of(std::iter::once(image));
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    layout.configure(&mut encoder);
    let mut writer = encoder.write_header().map_err(encoding)?;
    writer
        .write_image_data(&layout.image_data(image))
        .map_err(encoding)?;
    writer.finish().map_err(encoding)
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use png::{Decoder, Transformations};
use tracing::debug;

use super::{to_rgba, PixelLayout};
use crate::animation::{AnimationFrame, AnimationSequence, Delay, RasterFrame};
use crate::error::{Error, Result};

/// 编码到文件，出错时已写入的部分不会回滚
pub fn write(path: &Path, sequence: &AnimationSequence) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::io(path, source))?;
    let mut w = BufWriter::new(file);
    encode(&mut w, sequence, path)?;
    w.flush().map_err(|source| Error::io(path, source))
}

/// 默认图像写为独立的 IDAT，不计入 acTL 的帧数
pub fn encode<W: Write>(w: W, sequence: &AnimationSequence, path: &Path) -> Result<()> {
    let encoding = |source: png::EncodingError| Error::PngEncode {
        path: path.to_path_buf(),
        source,
    };

    let frames = sequence.frames();
    let (width, height) = sequence.canvas();
    let layout = PixelLayout::of(frames.iter().map(|f| &f.image));
    debug!(
        frames = frames.len(),
        animated = sequence.animated_len(),
        color = ?layout.color_type(),
        "encoding APNG"
    );

    let mut encoder = png::Encoder::new(w, width, height);
    layout.configure(&mut encoder);
    encoder
        .set_animated(sequence.animated_len() as u32, sequence.loop_count())
        .map_err(encoding)?;
    if sequence.has_default_image() {
        encoder.set_sep_def_img(true).map_err(encoding)?;
    }

    let mut writer = encoder.write_header().map_err(encoding)?;
    for frame in frames {
        if frame.is_default {
            writer.reset_frame_dimension().map_err(encoding)?;
        } else {
            writer.reset_frame_position().map_err(encoding)?;
            writer
                .set_frame_dimension(frame.image.width(), frame.image.height())
                .map_err(encoding)?;
            writer
                .set_frame_position(frame.x_offset, frame.y_offset)
                .map_err(encoding)?;
            writer
                .set_frame_delay(frame.delay.numerator, frame.delay.denominator)
                .map_err(encoding)?;
            writer
                .set_dispose_op(frame.dispose_op.into())
                .map_err(encoding)?;
            writer.set_blend_op(frame.blend_op.into()).map_err(encoding)?;
        }
        writer
            .write_image_data(&layout.image_data(&frame.image))
            .map_err(encoding)?;
    }
    writer.finish().map_err(encoding)
}

pub fn read(path: &Path) -> Result<AnimationSequence> {
    let data = fs::read(path).map_err(|source| Error::io(path, source))?;
    decode(&data, path)
}

/// 解码 APNG，所有帧展开为真彩色。
///
/// 非动画 PNG 视为只有一帧的动画；IDAT 前没有 fcTL 时第 0 帧是默认图像。
pub fn decode(data: &[u8], path: &Path) -> Result<AnimationSequence> {
    let decoding = |source: png::DecodingError| Error::PngDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(data);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decoding)?;

    let info = reader.info();
    let (count, loop_count, has_default) = match info.animation_control.as_ref() {
        Some(control) => {
            let has_default = info.frame_control().is_none();
            let count = control.num_frames as usize + usize::from(has_default);
            (count, control.num_plays, has_default)
        }
        None => (1, 0, false),
    };

    // acTL 的帧数来自文件本身，不能用来预分配
    let mut frames = Vec::new();
    for index in 0..count {
        let mut buf = vec![0; reader.output_buffer_size()];
        let output = reader.next_frame(&mut buf).map_err(decoding)?;
        let pixels = to_rgba(output.color_type, &buf[..output.buffer_size()])
            .ok_or(Error::UnsupportedColorMode(output.color_type))?;

        let mut frame =
            AnimationFrame::new(RasterFrame::true_color(output.width, output.height, pixels));
        frame.delay = Delay {
            numerator: 0,
            denominator: 0,
        };
        let is_default = index == 0 && has_default;
        match reader.info().frame_control() {
            Some(control) if !is_default => {
                frame.x_offset = control.x_offset;
                frame.y_offset = control.y_offset;
                frame.delay = Delay {
                    numerator: control.delay_num,
                    denominator: control.delay_den,
                };
                frame.dispose_op = control.dispose_op.into();
                frame.blend_op = control.blend_op.into();
            }
            _ => frame.is_default = is_default,
        }
        frames.push(frame);
    }

    AnimationSequence::new(loop_count, frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{BlendOp, DisposeOp, Palette, Rgba};
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, color: Rgba) -> RasterFrame {
        RasterFrame::true_color(width, height, vec![color; (width * height) as usize])
    }

    fn frame(image: RasterFrame) -> AnimationFrame {
        AnimationFrame::new(image)
    }

    fn round_trip(sequence: &AnimationSequence) -> AnimationSequence {
        let mut data = vec![];
        encode(&mut data, sequence, Path::new("mem.png")).unwrap();
        decode(&data, Path::new("mem.png")).unwrap()
    }

    fn metadata(frame: &AnimationFrame) -> (u32, u32, Delay, DisposeOp, BlendOp, bool) {
        (
            frame.x_offset,
            frame.y_offset,
            frame.delay,
            frame.dispose_op,
            frame.blend_op,
            frame.is_default,
        )
    }

    #[test]
    fn round_trip_preserves_metadata_and_pixels() {
        let mut second = frame(solid(2, 1, Rgba::new(0, 255, 0, 128)));
        second.x_offset = 1;
        second.y_offset = 2;
        second.delay = Delay::new(7, 100).unwrap();
        second.dispose_op = DisposeOp::Previous;
        second.blend_op = BlendOp::Over;
        let mut first = frame(solid(3, 3, Rgba::new(255, 0, 0, 255)));
        first.dispose_op = DisposeOp::None;
        let sequence = AnimationSequence::new(4, vec![first, second]).unwrap();

        let decoded = round_trip(&sequence);
        assert_eq!(decoded.loop_count(), 4);
        assert_eq!(decoded.frames().len(), 2);
        for (a, b) in sequence.frames().iter().zip(decoded.frames()) {
            assert_eq!(metadata(a), metadata(b));
            assert_eq!(a.image.dimensions(), b.image.dimensions());
            assert_eq!(a.image.to_rgba(), b.image.to_rgba());
        }
    }

    #[test]
    fn shared_palette_round_trips_pixel_identical() {
        let palette = Palette::new(vec![
            Rgba::new(255, 0, 0, 255),
            Rgba::new(0, 0, 255, 255),
            Rgba::new(0, 0, 0, 0),
        ]);
        let a = RasterFrame::indexed(2, 2, palette.clone(), vec![0, 1, 2, 0]);
        let b = RasterFrame::indexed(2, 2, palette, vec![2, 2, 1, 1]);
        let sequence = AnimationSequence::new(0, vec![frame(a), frame(b)]).unwrap();

        let mut data = vec![];
        encode(&mut data, &sequence, Path::new("mem.png")).unwrap();
        let header = Decoder::new(&data[..]).read_info().unwrap();
        assert_eq!(header.info().color_type, png::ColorType::Indexed);

        let decoded = decode(&data, Path::new("mem.png")).unwrap();
        for (a, b) in sequence.frames().iter().zip(decoded.frames()) {
            assert_eq!(a.image.to_rgba(), b.image.to_rgba());
        }
    }

    #[test]
    fn default_image_is_stored_but_not_animated() {
        let mut default = frame(solid(2, 2, Rgba::new(9, 9, 9, 255)));
        default.is_default = true;
        let sequence = AnimationSequence::new(
            0,
            vec![
                default,
                frame(solid(2, 2, Rgba::new(1, 1, 1, 255))),
                frame(solid(2, 2, Rgba::new(2, 2, 2, 255))),
            ],
        )
        .unwrap();

        let mut data = vec![];
        encode(&mut data, &sequence, Path::new("mem.png")).unwrap();
        let header = Decoder::new(&data[..]).read_info().unwrap();
        assert_eq!(header.info().animation_control.as_ref().map(|c| c.num_frames), Some(2));

        let decoded = decode(&data, Path::new("mem.png")).unwrap();
        assert_eq!(decoded.frames().len(), 3);
        assert_eq!(decoded.animated_len(), 2);
        assert!(decoded.frames()[0].is_default);
        assert_eq!(
            decoded.frames()[0].image.pixel(0, 0),
            Some(Rgba::new(9, 9, 9, 255))
        );
        assert_eq!(
            decoded.frames()[2].image.pixel(1, 1),
            Some(Rgba::new(2, 2, 2, 255))
        );
    }

    #[test]
    fn overstated_frame_count_is_a_decode_error() {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, 1, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_animated(0x4000_0000, 0).unwrap();
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 255]).unwrap();
            // 声明的帧数远多于实际写入的帧
            let _ = writer.finish();
        }
        let result = decode(&data, Path::new("broken.png"));
        assert!(matches!(result, Err(Error::PngDecode { .. })));
    }

    #[test]
    fn plain_png_reads_as_single_frame() {
        let mut data = vec![];
        crate::codec::still::encode(
            &mut data,
            &solid(1, 1, Rgba::new(4, 5, 6, 255)),
            Path::new("still.png"),
        )
        .unwrap();
        let decoded = decode(&data, Path::new("still.png")).unwrap();
        assert_eq!(decoded.frames().len(), 1);
        assert!(!decoded.has_default_image());
    }
}

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use super::file_stem;
use crate::animation::{AnimationFrameBuilder, StillFrame};
use crate::codec::{apng, gif_reader, still};
use crate::config::Settings;
use crate::error::{Error, Result};

/// `<输出目录>/<文件名>.png`
pub fn output_path(input: &Path, settings: &Settings) -> PathBuf {
    settings
        .output_dir
        .join(format!("{}.png", file_stem(input)))
}

/// 按扩展名选择解码器，转换为 APNG
pub fn convert(input: &Path, settings: &Settings) -> Result<String> {
    let output = output_path(input, settings);
    let mut report = String::new();
    let _ = writeln!(
        report,
        "Attempting to convert {} to {}",
        input.display(),
        output.display()
    );

    let extension = input
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let builder = AnimationFrameBuilder::new(settings);

    let sequence = match extension.as_str() {
        "gif" => {
            let gif = gif_reader::read(input)?;
            let _ = writeln!(report, "Handling GIF, total frames: {}", gif.frames.len());
            builder.from_gif(gif)?
        }
        "png" | "apng" => {
            let _ = writeln!(report, "Handling still image");
            let mut frame = StillFrame::new(still::read(input)?);
            // 只有一帧时不能作为默认图像
            frame.overrides.is_default = Some(false);
            builder.from_stills(vec![frame])?
        }
        _ => {
            return Err(Error::UnsupportedFormat {
                path: input.to_path_buf(),
            })
        }
    };

    apng::write(&output, &sequence)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        frames = sequence.frames().len(),
        "converted"
    );
    let _ = writeln!(report, "{}", "Done!".green());
    Ok(report)
}

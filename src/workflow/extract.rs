use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::debug;

use super::file_stem;
use crate::animation::FrameNamer;
use crate::codec::{apng, still};
use crate::config::Settings;
use crate::error::{Error, Result};

/// `<输出目录>/<文件名>/`
pub fn export_dir(input: &Path, settings: &Settings) -> PathBuf {
    settings.output_dir.join(file_stem(input))
}

/// 把 APNG 的每一帧写成独立的 PNG
pub fn extract(input: &Path, settings: &Settings) -> Result<String> {
    let mut report = String::new();
    let _ = writeln!(report, "Parsing {}", input.display());
    let sequence = apng::read(input)?;
    let frames = sequence.frames();
    let _ = writeln!(report, "Extracting {} frames!", frames.len());

    let dir = export_dir(input, settings);
    if dir.is_dir() {
        debug!(dir = %dir.display(), "export directory exists, reusing it");
    }
    fs::create_dir_all(&dir).map_err(|source| Error::io(&dir, source))?;

    let namer = FrameNamer::new(
        frames.len(),
        settings.padding,
        settings.start,
        sequence.has_default_image(),
        settings.number_default,
    );
    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(namer.name(index));
        still::write(&path, &frame.image)?;
        let _ = writeln!(report, "{}...{}", path.display(), "ok!".green());
    }
    Ok(report)
}

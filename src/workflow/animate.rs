use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use crate::animation::{AnimationFrameBuilder, FrameOverrides, StillFrame};
use crate::codec::{apng, still};
use crate::config::Settings;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};

/// 用静态 PNG 组装 APNG，帧来自命令行列表或描述文件，二者只能选一
pub fn animate(
    output: &Path,
    frames: &[PathBuf],
    descriptor: Option<&Path>,
    settings: &Settings,
) -> Result<String> {
    let entries: Vec<(PathBuf, FrameOverrides)> = match descriptor {
        Some(_) if !frames.is_empty() => {
            return Err(Error::config(
                "frame files and --descriptor cannot be combined",
            ))
        }
        Some(path) => Descriptor::read(path)?.entries()?,
        None => frames
            .iter()
            .map(|path| (path.clone(), FrameOverrides::default()))
            .collect(),
    };
    if entries.is_empty() {
        return Err(Error::config("no frames to animate"));
    }

    let mut report = String::new();
    let mut stills = Vec::with_capacity(entries.len());
    for (path, overrides) in entries {
        let _ = writeln!(report, "Adding {}...", path.display());
        stills.push(StillFrame {
            raster: still::read(&path)?,
            overrides,
        });
    }

    let sequence = AnimationFrameBuilder::new(settings).from_stills(stills)?;
    apng::write(output, &sequence)?;
    info!(
        output = %output.display(),
        frames = sequence.frames().len(),
        "animation written"
    );
    let _ = writeln!(
        report,
        "Wrote {} ({} frames) {}",
        output.display(),
        sequence.frames().len(),
        "ok!".green()
    );
    Ok(report)
}

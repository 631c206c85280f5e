use std::fmt::Write as _;
use std::path::Path;

use colored::Colorize;

use crate::animation::AnimationSequence;
use crate::codec::apng;
use crate::config::Settings;
use crate::error::Result;

/// 打印 APNG 的逐帧信息
pub fn query(input: &Path, _settings: &Settings) -> Result<String> {
    let sequence = apng::read(input)?;
    Ok(format!("Parsing {}\n{}", input.display(), describe(&sequence)))
}

pub fn describe(sequence: &AnimationSequence) -> String {
    let mut out = String::new();
    let frames = sequence.frames();
    let _ = writeln!(out, "Found {} frames!", frames.len());

    let skipped = usize::from(sequence.has_default_image());
    for (index, frame) in frames.iter().enumerate() {
        if frame.is_default {
            let _ = writeln!(out, "{}", "Default Image (not included in animation)".yellow());
        } else {
            let _ = writeln!(out, "{}", format!("Frame {}", index - skipped).bold());
        }
        let (width, height) = frame.image.dimensions();
        let _ = writeln!(out, "\tWidth x Height: {}x{}", width, height);
        let _ = writeln!(out, "\tXOffset x YOffset: {}x{}", frame.x_offset, frame.y_offset);
        let _ = writeln!(out, "\tDelay: {:.6}", frame.delay.seconds());
        let _ = writeln!(
            out,
            "\tDispose: {} ({})",
            frame.dispose_op,
            png::DisposeOp::from(frame.dispose_op) as u8
        );
        let _ = writeln!(
            out,
            "\tBlend: {} ({})",
            frame.blend_op,
            png::BlendOp::from(frame.blend_op) as u8
        );
    }

    let loops = match sequence.loop_count() {
        0 => "infinite".to_string(),
        n => n.to_string(),
    };
    let _ = writeln!(
        out,
        "Animated frames: {}, loops: {}",
        sequence.animated_len(),
        loops
    );
    out
}

mod builder;
mod frame;
mod naming;
pub mod palette;
mod raster;

pub use builder::{AnimationFrameBuilder, FrameOverrides, StillFrame};
pub use frame::{AnimationFrame, AnimationSequence, BlendOp, Delay, DisposeOp};
pub use naming::FrameNamer;
pub use raster::{Palette, Placement, RasterFrame, Rgba, PALETTE_CAPACITY, TRANSPARENT};

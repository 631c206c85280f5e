mod animate;
mod batch;
mod convert;
mod extract;
mod query;

use std::path::Path;

pub use animate::animate;
pub use batch::{run_batch, Task};
pub use convert::convert;
pub use extract::extract;
pub use query::query;

/// 去掉扩展名的文件名，作为输出文件或目录的名字
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string())
}

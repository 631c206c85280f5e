/// 默认图像不参与编号时使用的文件名
pub const DEFAULT_FRAME_NAME: &str = "default.png";

/// 提取帧时的文件命名规则
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameNamer {
    width: usize,
    start: usize,
    /// 第 0 帧是默认图像且使用固定名称
    named_default: bool,
}

impl FrameNamer {
    /// `padding` 缺省时补零宽度为 `total` 的十进制位数
    pub fn new(
        total: usize,
        padding: Option<usize>,
        start: usize,
        has_default: bool,
        number_default: bool,
    ) -> FrameNamer {
        FrameNamer {
            width: padding.unwrap_or_else(|| digits(total)),
            start,
            named_default: has_default && !number_default,
        }
    }

    pub fn name(&self, index: usize) -> String {
        if self.named_default {
            if index == 0 {
                return DEFAULT_FRAME_NAME.to_string();
            }
            return self.numbered(index - 1);
        }
        self.numbered(index)
    }

    fn numbered(&self, position: usize) -> String {
        format!(
            "{:0width$}.png",
            position + self.start,
            width = self.width
        )
    }
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

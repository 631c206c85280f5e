use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// 打开、创建、读写文件或目录失败
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// GIF 容器格式损坏
    #[error("failed to decode GIF {}: {source}", path.display())]
    GifDecode {
        path: PathBuf,
        #[source]
        source: gif::DecodingError,
    },

    #[error("failed to decode PNG {}: {source}", path.display())]
    PngDecode {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    #[error("failed to encode PNG {}: {source}", path.display())]
    PngEncode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    /// 帧描述文件不是合法的 JSON
    #[error("malformed descriptor {}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 配置错误，对整个调用是致命的
    #[error("configuration error: {0}")]
    Config(String),

    /// 没有对应扩展名的解码器
    #[error("unsupported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// 不支持的png颜色模式
    #[error("unsupported color mode: {0:?}")]
    UnsupportedColorMode(png::ColorType),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

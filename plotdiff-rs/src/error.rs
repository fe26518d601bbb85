use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to parse SVG: {0}")]
    SvgParse(#[from] usvg::Error),

    #[error("Failed to allocate {width}x{height} pixmap for SVG rendering")]
    SvgRender { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    PngEncode(String),

    #[error("Rasterizer exited with {status}: {stderr}")]
    Rasterization { status: ExitStatus, stderr: String },

    #[error("Document rendered fully blank, broken test fixture: {}", path.display())]
    BlankRender { path: PathBuf },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data at byte {pos}")]
    UnexpectedEof { pos: usize },

    #[error("seek to byte {pos} outside {len}-byte stream")]
    SeekOutOfRange { pos: u64, len: usize },

    #[error("unsupported lotpack version {0}")]
    UnsupportedPackVersion(i32),

    #[error("unsupported lotheader version {0}")]
    UnsupportedHeaderVersion(i32),

    #[error("invalid stack count {count} at byte {pos}")]
    InvalidStackCount { count: i32, pos: usize },

    #[error("invalid skip count {skip} at byte {pos}")]
    InvalidSkip { skip: i32, pos: usize },

    #[error("tile index {index} out of range (table has {len} entries)")]
    TileIndexOutOfRange { index: i32, len: usize },

    #[error("invalid lotheader: {0}")]
    InvalidHeader(String),

    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unsupported rule file version {found} (latest is {latest})")]
    UnsupportedRulesVersion { found: i32, latest: i32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }

    /// Attach the path of the file being processed.
    pub fn in_file(self, path: &Path) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source: Box::new(self),
        }
    }

    /// Line number of a syntax error, looking through path context.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            Self::File { source, .. } => source.line(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CountError {
    #[error("failed to open frame source {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },
    #[error("frame source {0} contains no frames")]
    EmptySource(String),
    #[error("invalid zone ({x1}, {y1}, {x2}, {y2}): expected x1 < x2 and y1 < y2")]
    InvalidZone { x1: i32, y1: i32, x2: i32, y2: i32 },
    #[error("cannot parse zone `{0}`, expected x1,y1,x2,y2")]
    ZoneSyntax(String),
    #[error("unknown direction `{0}`, expected `board` or `alight`")]
    UnknownDirection(String),
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

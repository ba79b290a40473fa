use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncodingError>;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("marshaling with codec '{codec}': {reason}")]
    Marshal { codec: String, reason: String },

    #[error("unmarshaling with codec '{codec}': {reason}")]
    Unmarshal { codec: String, reason: String },

    #[error("codec '{codec}' cannot unmarshal into type '{target}'")]
    UnsupportedTarget {
        codec: String,
        target: &'static str,
    },
}

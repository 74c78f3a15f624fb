use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Batch length mismatch: sent {sent} samples, received {received} predictions")]
    BatchMismatch { sent: usize, received: usize },

    #[error("Unsupported tensor dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Response has no \"{0}\" field")]
    MissingOutputs(String),

    #[error("Malformed outputs: {0}")]
    MalformedOutputs(String),

    #[error("Nothing to evaluate: no predictions were collected")]
    EmptyEvaluation,

    #[error("Record error: {0}")]
    Record(String),

    #[error("HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },

    #[error("HTTP transport error: {0}")]
    HttpTransport(String),

    #[error("gRPC status: {0}")]
    Status(#[from] tonic::Status),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Array shape error: {0}")]
    Array(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

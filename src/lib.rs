pub mod grpc;
pub mod error;
pub mod tensor;
pub mod tfrecord;
pub mod config;
pub mod cli;
pub mod data;
pub mod metrics;
pub mod inference;
pub mod rpc;
pub mod rest;
pub mod export;

pub use crate::error::{Error, Result};
pub use crate::config::{ExportConfig, ServingConfig};
pub use crate::cli::{FashionMnistArgs, FraudClientArgs, FraudExportArgs, RnnType};
pub use crate::data::{Batch, BatchSource, InMemorySource};
pub use crate::metrics::{accuracy, DecisionRule};
pub use crate::inference::{evaluate, Evaluation, Predictor};
pub use crate::rpc::RpcClient;
pub use crate::rest::RestClient;
pub use crate::export::{export_servable, export_with_source, ExportReport};

/// Logger setup shared by the binaries; `RUST_LOG` overrides the default level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

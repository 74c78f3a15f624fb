use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, ValueEnum};

use crate::config::{ExportConfig, ServingConfig, DEFAULT_SIGNATURE};


#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RnnType {
    Lstm,
    Gru,
}

impl RnnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RnnType::Lstm => "lstm",
            RnnType::Gru => "gru",
        }
    }
}

/// Options shared by every fraud sample.
#[derive(ClapArgs, Clone, Debug)]
pub struct FraudData {
    /// RNN type used within model
    #[arg(long, value_enum, ignore_case = true, default_value_t = RnnType::Lstm)]
    pub rnn_type: RnnType,

    /// Batch size for inference data
    #[arg(long, default_value_t = 2000)]
    pub batch_size: usize,

    /// Sequence length for inference data
    #[arg(long, default_value_t = 7)]
    pub seq_length: usize,

    /// Preprocessed transaction CSV
    #[arg(long = "data", default_value = "./data/card_transaction.test.csv")]
    pub csv: PathBuf,

    /// Name of the label column in the CSV header
    #[arg(long, default_value = "is_fraud")]
    pub label_column: String,
}

/// Serving host endpoints.
#[derive(ClapArgs, Clone, Debug)]
pub struct Endpoint {
    /// gRPC address of the serving host
    #[arg(long, default_value = crate::config::DEFAULT_GRPC_ADDR)]
    pub grpc_addr: String,

    /// Base URL of the serving host REST API
    #[arg(long, default_value = crate::config::DEFAULT_REST_URL)]
    pub rest_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,
}

impl Endpoint {
    pub fn apply(&self, config: ServingConfig) -> ServingConfig {
        config.with_endpoints(
            &self.grpc_addr,
            &self.rest_url,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Fraud model inference client", long_about = None)]
pub struct FraudClientArgs {
    #[command(flatten)]
    pub data: FraudData,

    #[command(flatten)]
    pub endpoint: Endpoint,
}

impl FraudClientArgs {
    pub fn serving_config(&self) -> ServingConfig {
        self.endpoint
            .apply(ServingConfig::fraud(self.data.rnn_type.as_str()))
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Export the fraud model as a servable with warm-up data", long_about = None)]
pub struct FraudExportArgs {
    #[command(flatten)]
    pub data: FraudData,

    /// Trained SavedModel directory (default: ./saved_model/<rnn-type>)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Root directory of exported servables
    #[arg(long, default_value = "./serving_model")]
    pub output_dir: PathBuf,

    /// Servable version
    #[arg(long, default_value_t = 1)]
    pub model_version: u64,
}

impl FraudExportArgs {
    pub fn export_config(&self) -> ExportConfig {
        let name = self.data.rnn_type.as_str();
        let serving = ServingConfig::fraud(name);
        ExportConfig {
            model_dir: self
                .model_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("./saved_model").join(name)),
            output_dir: self.output_dir.clone(),
            version: self.model_version,
            model_name: serving.model_name,
            signature_name: DEFAULT_SIGNATURE.to_string(),
            input_name: serving.input_name,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Fashion-MNIST inference client", long_about = None)]
pub struct FashionMnistArgs {
    /// Directory holding the t10k IDX files
    #[arg(long, default_value = "./data/fashion_mnist")]
    pub data_dir: PathBuf,

    /// Images per request
    #[arg(long, default_value_t = 10000)]
    pub batch_size: usize,

    #[command(flatten)]
    pub endpoint: Endpoint,
}

impl FashionMnistArgs {
    pub fn serving_config(&self) -> ServingConfig {
        self.endpoint.apply(ServingConfig::fashion_mnist())
    }
}

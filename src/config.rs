use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GRPC_ADDR: &str = "localhost:8500";
pub const DEFAULT_REST_URL: &str = "http://localhost:8501";
pub const DEFAULT_SIGNATURE: &str = "serving_default";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest gRPC response the client accepts.
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024 * 1024;

/// Where a served model lives and how its signature is called.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingConfig {
    /// `host:port` of the gRPC `PredictionService`.
    pub grpc_addr: String,
    /// Scheme, host and port of the REST API, without a path.
    pub rest_url: String,
    /// Per-call deadline, used by both transports.
    pub timeout: Duration,
    pub model_name: String,
    pub signature_name: String,
    pub input_name: String,
    pub output_name: String,
}

impl ServingConfig {
    /// The recurrent fraud model, served under its RNN type.
    pub fn fraud(model_name: &str) -> Self {
        Self {
            grpc_addr: DEFAULT_GRPC_ADDR.to_string(),
            rest_url: DEFAULT_REST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            model_name: model_name.to_string(),
            signature_name: DEFAULT_SIGNATURE.to_string(),
            input_name: "input_1".to_string(),
            output_name: "output_0".to_string(),
        }
    }

    pub fn fashion_mnist() -> Self {
        Self {
            grpc_addr: DEFAULT_GRPC_ADDR.to_string(),
            rest_url: DEFAULT_REST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            model_name: "fashion_mnist".to_string(),
            signature_name: DEFAULT_SIGNATURE.to_string(),
            input_name: "conv2d_input".to_string(),
            output_name: "dense_2".to_string(),
        }
    }

    pub fn with_endpoints(mut self, grpc_addr: &str, rest_url: &str, timeout: Duration) -> Self {
        self.grpc_addr = grpc_addr.to_string();
        self.rest_url = rest_url.trim_end_matches('/').to_string();
        self.timeout = timeout;
        self
    }

    /// `<rest_url>/v1/models/<model>:predict`
    pub fn predict_url(&self) -> String {
        format!("{}/v1/models/{}:predict", self.rest_url, self.model_name)
    }

    /// gRPC endpoints need a scheme; a bare `host:port` is taken as plaintext HTTP/2.
    pub fn grpc_uri(&self) -> String {
        if self.grpc_addr.contains("://") {
            self.grpc_addr.clone()
        } else {
            format!("http://{}", self.grpc_addr)
        }
    }
}

/// Inputs of the servable export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Trained SavedModel directory.
    pub model_dir: PathBuf,
    /// Root under which `<model_name>/<version>/` is created.
    pub output_dir: PathBuf,
    pub version: u64,
    pub model_name: String,
    pub signature_name: String,
    pub input_name: String,
}

impl ExportConfig {
    pub fn servable_dir(&self) -> PathBuf {
        self.output_dir
            .join(&self.model_name)
            .join(self.version.to_string())
    }

    pub fn warmup_file(&self) -> PathBuf {
        self.servable_dir()
            .join("assets.extra")
            .join("tf_serving_warmup_requests")
    }
}

//! Blocking client for the TensorFlow Serving gRPC `PredictionService`.

use std::collections::HashMap;

use log::info;
use ndarray::{ArrayD, ArrayViewD};
use tokio::runtime::Runtime;
use tonic::transport::{Channel, Endpoint};

use crate::config::{ServingConfig, MAX_MESSAGE_BYTES};
use crate::error::{Error, Result};
use crate::grpc::{ModelSpec, PredictRequest, PredictResponse, PredictionServiceClient};
use crate::inference::Predictor;
use crate::tensor::{make_ndarray, make_tensor_proto};

/// Builds the request for one batch: model, signature, input tensor and the
/// single output the caller wants back.
pub fn predict_request(config: &ServingConfig, inputs: &ArrayViewD<'_, f32>) -> PredictRequest {
    let mut tensors = HashMap::new();
    tensors.insert(config.input_name.clone(), make_tensor_proto(inputs));

    PredictRequest {
        model_spec: Some(ModelSpec {
            name: config.model_name.clone(),
            signature_name: config.signature_name.clone(),
        }),
        inputs: tensors,
        output_filter: vec![config.output_name.clone()],
    }
}

/// Pulls `output_name` out of a response and decodes it.
pub fn decode_response(response: &PredictResponse, output_name: &str) -> Result<ArrayD<f32>> {
    let tensor = response
        .outputs
        .get(output_name)
        .ok_or_else(|| Error::MissingOutputs(output_name.to_string()))?;
    make_ndarray(tensor)
}

/// One channel to the serving host, reused for every call. The client owns a
/// current-thread runtime so callers stay synchronous.
pub struct RpcClient {
    runtime: Runtime,
    client: PredictionServiceClient<Channel>,
    config: ServingConfig,
}

impl RpcClient {
    pub fn connect(config: ServingConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let endpoint = Endpoint::from_shared(config.grpc_uri())?
            .connect_timeout(config.timeout)
            .timeout(config.timeout);
        let channel = runtime.block_on(endpoint.connect())?;
        info!("connected to {}", config.grpc_addr);

        let client = PredictionServiceClient::new(channel)
            .max_decoding_message_size(MAX_MESSAGE_BYTES);

        Ok(Self {
            runtime,
            client,
            config,
        })
    }

    pub fn config(&self) -> &ServingConfig {
        &self.config
    }
}

impl Predictor for RpcClient {
    fn predict(&mut self, inputs: &ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let mut request = tonic::Request::new(predict_request(&self.config, inputs));
        request.set_timeout(self.config.timeout);

        let client = &mut self.client;
        let response = self.runtime.block_on(client.predict(request))?;
        decode_response(response.get_ref(), &self.config.output_name)
    }
}

//! Protobuf messages and the `PredictionService` stubs generated by `build.rs`.

pub mod tensorflow {
    tonic::include_proto!("tensorflow");

    pub mod serving {
        tonic::include_proto!("tensorflow.serving");
    }
}

pub use tensorflow::serving::prediction_service_client::PredictionServiceClient;
pub use tensorflow::serving::prediction_service_server::{PredictionService, PredictionServiceServer};
pub use tensorflow::serving::{
    prediction_log, ModelSpec, PredictLog, PredictRequest, PredictResponse, PredictionLog,
};
pub use tensorflow::{tensor_shape_proto, DataType, TensorProto, TensorShapeProto};

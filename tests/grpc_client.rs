use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use ndarray::{Array2, Array3, Axis};
use tonic::{Request, Response, Status};

use serving_samples::grpc::{PredictRequest, PredictResponse, PredictionService, PredictionServiceServer};
use serving_samples::tensor::{make_ndarray, make_tensor_proto};
use serving_samples::{evaluate, DecisionRule, Error, InMemorySource, Predictor, RpcClient, ServingConfig};

/// Scores every sample with its first feature and remembers what it was sent.
#[derive(Default, Clone)]
struct FakeServing {
    seen: Arc<Mutex<Vec<PredictRequest>>>,
    delay: Option<Duration>,
}

#[tonic::async_trait]
impl PredictionService for FakeServing {
    async fn predict(
        &self,
        request: Request<PredictRequest>,
    ) -> Result<Response<PredictResponse>, Status> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let req = request.into_inner();
        self.seen.lock().unwrap().push(req.clone());

        let spec = req.model_spec.clone().unwrap_or_default();
        if spec.name == "unknown" {
            return Err(Status::not_found("Servable not found for request: Latest(unknown)"));
        }
        let input = req
            .inputs
            .values()
            .next()
            .ok_or_else(|| Status::invalid_argument("no inputs"))?;
        let inputs = make_ndarray(input).map_err(|e| Status::invalid_argument(e.to_string()))?;
        let n = inputs.shape()[0];
        let flat = inputs.to_shape((n, inputs.len() / n)).unwrap().to_owned();
        let scores = flat.index_axis(Axis(1), 0).to_owned().insert_axis(Axis(1)).into_dyn();

        let mut response = PredictResponse::default();
        for name in &req.output_filter {
            if name != "missing" {
                response.outputs.insert(name.clone(), make_tensor_proto(&scores.view()));
            }
        }
        Ok(Response::new(response))
    }
}

fn spawn_server(service: FakeServing) -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            tonic::transport::Server::builder()
                .add_service(PredictionServiceServer::new(service))
                .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
    });
    rx.recv().unwrap()
}

fn config(addr: SocketAddr, model: &str) -> ServingConfig {
    ServingConfig::fraud(model).with_endpoints(
        &addr.to_string(),
        "http://127.0.0.1:1",
        Duration::from_secs(5),
    )
}

fn fraud_source() -> InMemorySource {
    // First feature of each sequence is its score.
    let scores = [0.9f32, 0.2, 0.7, 0.4, 0.1, 0.6, 0.3];
    let inputs = Array3::from_shape_fn((7, 3, 2), |(i, _, _)| scores[i]);
    InMemorySource::new(inputs.into_dyn(), vec![1, 0, 1, 0, 0, 1, 1], 3, true).unwrap()
}

#[test]
fn fraud_batches_are_scored_over_grpc() {
    let service = FakeServing::default();
    let seen = service.seen.clone();
    let addr = spawn_server(service);

    let mut client = RpcClient::connect(config(addr, "gru")).unwrap();
    let eval = evaluate(&mut client, &fraud_source(), DecisionRule::Round).unwrap();

    assert_eq!(eval.batches, 2);
    assert_eq!(eval.samples, 6);
    assert_eq!(eval.accuracy, 1.0);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let spec = seen[0].model_spec.as_ref().unwrap();
    assert_eq!(spec.name, "gru");
    assert_eq!(spec.signature_name, "serving_default");
    assert_eq!(seen[0].output_filter, vec!["output_0".to_string()]);
    let sent = make_ndarray(&seen[1].inputs["input_1"]).unwrap();
    assert_eq!(sent.shape(), &[3, 3, 2]);
}

#[test]
fn image_scores_use_argmax() {
    let addr = spawn_server(FakeServing::default());
    let cfg = ServingConfig::fashion_mnist().with_endpoints(
        &addr.to_string(),
        "http://127.0.0.1:1",
        Duration::from_secs(5),
    );
    let mut client = RpcClient::connect(cfg).unwrap();

    // The fake echoes one column, so every row's arg-max is 0.
    let inputs = Array2::from_shape_vec((4, 2), vec![0.3, 0.1, 0.9, 0.2, 0.5, 0.5, 0.0, 1.0]).unwrap();
    let source = InMemorySource::new(inputs.into_dyn(), vec![0, 0, 0, 1], 4, false).unwrap();
    let eval = evaluate(&mut client, &source, DecisionRule::ArgMax).unwrap();
    assert_eq!(eval.accuracy, 0.75);
}

#[test]
fn unknown_model_status_is_propagated() {
    let addr = spawn_server(FakeServing::default());
    let mut client = RpcClient::connect(config(addr, "unknown")).unwrap();

    let inputs = ndarray::ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 7, 3]));
    let err = client.predict(&inputs.view()).unwrap_err();
    match err {
        Error::Status(status) => assert_eq!(status.code(), tonic::Code::NotFound),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn missing_output_field_is_a_decoding_error() {
    let addr = spawn_server(FakeServing::default());
    let mut cfg = config(addr, "lstm");
    cfg.output_name = "missing".into();
    let mut client = RpcClient::connect(cfg).unwrap();

    let inputs = ndarray::ArrayD::<f32>::zeros(ndarray::IxDyn(&[2, 7, 3]));
    assert!(matches!(client.predict(&inputs.view()), Err(Error::MissingOutputs(_))));
}

#[test]
fn slow_host_hits_the_deadline() {
    let addr = spawn_server(FakeServing {
        delay: Some(Duration::from_secs(2)),
        ..Default::default()
    });
    let cfg = ServingConfig::fraud("lstm").with_endpoints(
        &addr.to_string(),
        "http://127.0.0.1:1",
        Duration::from_millis(200),
    );
    let mut client = RpcClient::connect(cfg).unwrap();

    let inputs = ndarray::ArrayD::<f32>::zeros(ndarray::IxDyn(&[1, 7, 3]));
    assert!(client.predict(&inputs.view()).is_err());
}

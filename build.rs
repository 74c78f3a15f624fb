use std::path::Path;


fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    // SAFETY: the build script is single threaded at this point.
    unsafe {
        std::env::set_var("PROTOC", protoc);
    }

    let proto_dir = Path::new("proto");
    let protos = [
        proto_dir.join("tensorflow/core/framework/types.proto"),
        proto_dir.join("tensorflow/core/framework/tensor_shape.proto"),
        proto_dir.join("tensorflow/core/framework/tensor.proto"),
        proto_dir.join("tensorflow_serving/apis/model.proto"),
        proto_dir.join("tensorflow_serving/apis/predict.proto"),
        proto_dir.join("tensorflow_serving/apis/prediction_log.proto"),
        proto_dir.join("tensorflow_serving/apis/prediction_service.proto"),
    ];

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&protos, &[proto_dir.to_path_buf()])
        .map_err(|e| {
            eprintln!("Failed to compile protos: {}", e);
            e
        })?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}

//! Packages a trained SavedModel as a versioned servable and records a warm-up
//! request next to it.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use ndarray::ArrayViewD;
use prost::Message;

use crate::config::ExportConfig;
use crate::data::{Batch, BatchSource};
use crate::error::{Error, Result};
use crate::grpc::{prediction_log, ModelSpec, PredictLog, PredictRequest, PredictionLog};
use crate::tensor::make_tensor_proto;
use crate::tfrecord::TfRecordWriter;

const GRAPH_FILES: [&str; 2] = ["saved_model.pb", "saved_model.pbtxt"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub servable_dir: PathBuf,
    pub warmup_file: PathBuf,
    pub warmup_shape: Vec<usize>,
}

/// Checks that `dir` holds a SavedModel graph.
pub fn validate_saved_model(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::ModelLoad(format!("{} is not a directory", dir.display())));
    }
    if !GRAPH_FILES.iter().any(|f| dir.join(f).is_file()) {
        return Err(Error::ModelLoad(format!(
            "{} contains neither {}",
            dir.display(),
            GRAPH_FILES.join(" nor ")
        )));
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

/// The `PredictionLog` the serving host replays at load time.
pub fn warmup_log(config: &ExportConfig, inputs: &ArrayViewD<'_, f32>) -> PredictionLog {
    let mut tensors = HashMap::new();
    tensors.insert(config.input_name.clone(), make_tensor_proto(inputs));

    let request = PredictRequest {
        model_spec: Some(ModelSpec {
            name: config.model_name.clone(),
            signature_name: config.signature_name.clone(),
        }),
        inputs: tensors,
        output_filter: Vec::new(),
    };
    PredictionLog {
        log_type: Some(prediction_log::LogType::PredictLog(PredictLog {
            request: Some(request),
            response: None,
        })),
    }
}

pub fn write_warmup_file(path: &Path, log: &PredictionLog) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = TfRecordWriter::new(BufWriter::new(File::create(path)?));
    writer.write_record(&log.encode_to_vec())?;
    writer.into_inner()?;
    Ok(())
}

/// Stages `config.model_dir` under `<output_dir>/<model>/<version>/`, replacing
/// whatever was there, and writes one warm-up record built from `batch`.
pub fn export_servable(config: &ExportConfig, batch: &Batch) -> Result<ExportReport> {
    validate_saved_model(&config.model_dir)?;

    let servable_dir = config.servable_dir();
    if servable_dir.exists() {
        info!("replacing existing servable at {}", servable_dir.display());
        fs::remove_dir_all(&servable_dir)?;
    }
    copy_dir(&config.model_dir, &servable_dir)?;
    info!(
        "exported {} to {}",
        config.model_dir.display(),
        servable_dir.display()
    );

    let warmup_file = config.warmup_file();
    write_warmup_file(&warmup_file, &warmup_log(config, &batch.inputs.view()))?;
    info!(
        "wrote warm-up request of shape {:?} to {}",
        batch.inputs.shape(),
        warmup_file.display()
    );

    Ok(ExportReport {
        servable_dir,
        warmup_file,
        warmup_shape: batch.inputs.shape().to_vec(),
    })
}

/// Exports using the first batch of `source` as warm-up data.
pub fn export_with_source<S: BatchSource + ?Sized>(
    config: &ExportConfig,
    source: &S,
) -> Result<ExportReport> {
    let batch = source
        .batches()
        .next()
        .ok_or_else(|| Error::DataFormat("inference data yielded no batch".into()))?;
    export_servable(config, &batch)
}

use clap::Parser;
use log::info;

use serving_samples::data::fraud;
use serving_samples::{export_with_source, init_logging, FraudExportArgs};

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = FraudExportArgs::parse();
    let config = args.export_config();

    let source = fraud::inference_source(
        &args.data.csv,
        &args.data.label_column,
        args.data.batch_size,
        args.data.seq_length,
    )?;
    let report = export_with_source(&config, &source)?;

    info!(
        "servable ready at {} (warm-up input {:?})",
        report.servable_dir.display(),
        report.warmup_shape
    );
    Ok(())
}

use clap::Parser;

use serving_samples::data::fraud;
use serving_samples::{evaluate, init_logging, DecisionRule, FraudClientArgs, RpcClient};

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = FraudClientArgs::parse();
    let config = args.serving_config();

    let source = fraud::inference_source(
        &args.data.csv,
        &args.data.label_column,
        args.data.batch_size,
        args.data.seq_length,
    )?;
    let mut client = RpcClient::connect(config)?;
    let evaluation = evaluate(&mut client, &source, DecisionRule::Round)?;

    println!("Test accuracy: {}", evaluation.accuracy);
    Ok(())
}

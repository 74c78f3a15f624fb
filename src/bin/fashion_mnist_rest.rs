use clap::Parser;
use log::info;

use serving_samples::data::fashion_mnist;
use serving_samples::{evaluate, init_logging, DecisionRule, FashionMnistArgs, RestClient};

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = FashionMnistArgs::parse();
    let config = args.serving_config();

    let source = fashion_mnist::inference_source(&args.data_dir, args.batch_size)?;
    let mut client = RestClient::new(config);
    info!("posting batches to {}", client.url());
    let evaluation = evaluate(&mut client, &source, DecisionRule::ArgMax)?;

    println!("Test accuracy: {}", evaluation.accuracy);
    Ok(())
}

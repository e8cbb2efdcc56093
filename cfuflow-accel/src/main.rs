use anyhow::{ensure, Result};
use cfuflow_accel::{CoreConfig, Session, Workload};
use clap::Parser;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(name = "cfuflow-accel", about = "Run random passes through the accelerator core and check them against the reference model")]
struct Args {
    #[arg(long, default_value_t = 16)]
    words: usize,
    #[arg(long, default_value_t = 4)]
    depth: usize,
    #[arg(long, default_value_t = 8)]
    passes: usize,
    #[arg(long)]
    half: bool,
    #[arg(long, default_value_t = 128, allow_negative_numbers = true)]
    input_offset: i16,
    #[arg(long, default_value_t = -128, allow_negative_numbers = true)]
    output_offset: i16,
    #[arg(long, default_value_t = -128, allow_negative_numbers = true)]
    activation_min: i8,
    #[arg(long, default_value_t = 127, allow_negative_numbers = true)]
    activation_max: i8,
    #[arg(long, default_value_t = 0.5)]
    ready_probability: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let a = Args::parse();

    let config = CoreConfig {
        num_filter_words: a.words,
        output_channel_depth: a.depth,
        input_offset: a.input_offset,
        output_offset: a.output_offset,
        output_activation_min: a.activation_min,
        output_activation_max: a.activation_max,
    }
    .validated()?;

    let mut rng = SmallRng::seed_from_u64(a.seed);
    let workload = Workload::random(&mut rng, config, a.passes, a.half);
    let mut session = Session::new(config, a.ready_probability, a.seed)?;

    info!("running {} passes of {} words (depth={}, half={})", a.passes, a.words, a.depth, a.half);
    let words = workload.run(&mut session)?;
    let expected = workload.expected();

    ensure!(words == expected, "output words differ from the reference model: {:08x?} != {:08x?}", words, expected);
    println!("{} words in {} cycles match the reference model", words.len(), session.cycle());
    Ok(())
}

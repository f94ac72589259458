use std::time::Instant;

use clap::Parser;
use fc_net::{Activation, Inputs, NetBuilder};

#[derive(Parser, Debug)]
#[command(about = "Time batched inference against per-sample inference")]
struct Args {
    #[arg(long, default_value_t = 128)]
    batch_size: usize,
    #[arg(long, default_value_t = 200)]
    iters: usize,
    #[arg(long, default_value_t = 128)]
    in_dim: usize,
    #[arg(long, default_value_t = 256)]
    hidden: usize,
    #[arg(long, default_value_t = 2)]
    layers: usize,
    #[arg(long, default_value_t = 10)]
    out_dim: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> fc_net::Result<()> {
    let args = Args::parse();

    let mut builder = NetBuilder::new(args.in_dim)?;
    for _ in 0..args.layers {
        builder = builder.add_layer(args.hidden, Activation::Tanh)?;
    }
    let net = builder
        .add_layer(args.out_dim, Activation::Identity)?
        .build_with_seed(args.seed)?;

    let backend = if cfg!(feature = "matrixmultiply") {
        "matrixmultiply"
    } else {
        "naive"
    };

    // Deterministic, non-constant inputs, small enough to avoid saturation.
    let flat: Vec<f32> = (0..args.batch_size * args.in_dim)
        .map(|i| ((i % 997) as f32) * 1e-3)
        .collect();
    let inputs = Inputs::from_flat(flat, args.in_dim)?;

    let start = Instant::now();
    let mut checksum = 0.0_f32;
    for _ in 0..args.iters {
        let out = net.calc_inputs(std::hint::black_box(&inputs))?;
        checksum += out[0];
    }
    let batched = start.elapsed().as_secs_f64();

    let mut scratch = net.scratch();
    let start = Instant::now();
    for _ in 0..args.iters {
        for i in 0..inputs.len() {
            checksum += net.forward(std::hint::black_box(inputs.input(i)), &mut scratch)[0];
        }
    }
    let single = start.elapsed().as_secs_f64();
    std::hint::black_box(checksum);

    let samples = (args.iters * args.batch_size) as f64;
    println!(
        "backend={backend} batch_size={} iters={} batched_samples_per_s={:.0} single_samples_per_s={:.0}",
        args.batch_size,
        args.iters,
        samples / batched,
        samples / single
    );

    Ok(())
}

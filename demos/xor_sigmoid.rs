use fc_net::{Activation, ActivationOptions, Dataset, FitConfig, Loss, NetOptions, Shuffle, init};

fn main() -> fc_net::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Classic XOR dataset.
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let data = Dataset::from_rows(&xs, &ys)?;

    // 2 -> 4 -> 4 -> 1, sigmoid everywhere.
    let options = NetOptions {
        title: Some("xor".to_owned()),
        seed: Some(0),
        activations: ActivationOptions {
            all_layers: Some(Activation::Sigmoid),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut net = init(2, 1, &[4, 4], &options)?;

    let report = net.fit(
        &data,
        FitConfig {
            max_epochs: 20_000,
            learning_rate: Some(0.5),
            precision: Some(0.05),
            shuffle: Shuffle::Seeded(0),
            log_every: Some(2_000),
        },
    )?;
    println!(
        "epochs={} converged={} max_error={:.4} mse={:.6}",
        report.epochs,
        report.converged,
        report.max_error,
        net.evaluate(&data, Loss::MeanSquared)?
    );

    for (x, _) in data.iter() {
        println!("x={x:?} y={:.3?}", net.calc(x)?);
    }

    for (i, layer) in net.layers().iter().enumerate() {
        println!("layer {i} weights (bias row last): {:?}", layer.to_matrix());
    }

    Ok(())
}

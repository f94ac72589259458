use fc_net::{Activation, ActivationOptions, Dataset, FitConfig, NetOptions, Shuffle, init};

const INPUTS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

fn main() -> fc_net::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let tables: [(&str, [f32; 4]); 4] = [
        ("and", [0.0, 0.0, 0.0, 1.0]),
        ("or", [0.0, 1.0, 1.0, 1.0]),
        ("nand", [1.0, 1.0, 1.0, 0.0]),
        ("xor", [0.0, 1.0, 1.0, 0.0]),
    ];

    let xs: Vec<Vec<f32>> = INPUTS.iter().map(|x| x.to_vec()).collect();
    for (name, outputs) in tables {
        let ys: Vec<Vec<f32>> = outputs.iter().map(|&y| vec![y]).collect();
        let data = Dataset::from_rows(&xs, &ys)?;

        let options = NetOptions {
            title: Some(name.to_owned()),
            seed: Some(1),
            activations: ActivationOptions {
                all_layers: Some(Activation::Sigmoid),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut net = init(2, 1, &[3], &options)?;
        let report = net.fit(
            &data,
            FitConfig {
                max_epochs: 20_000,
                learning_rate: Some(0.5),
                precision: Some(0.1),
                shuffle: Shuffle::Seeded(1),
                log_every: None,
            },
        )?;

        let answers = data
            .iter()
            .map(|(x, _)| net.calc(x).map(|y| y[0].round()))
            .collect::<fc_net::Result<Vec<_>>>()?;
        println!(
            "{name:>4}: epochs={:>5} converged={} answers={answers:?} expected={outputs:?}",
            report.epochs, report.converged
        );
    }

    Ok(())
}

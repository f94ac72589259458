use fc_net::{
    Activation, ActivationOptions, Dataset, Error, FitConfig, Layer, Net, NetOptions, Shuffle,
    init, loss,
};

const WEIGHTS: [[f32; 2]; 2] = [[0.2, 0.6], [0.5, 0.3]];
const BIAS: [f32; 2] = [0.1, 0.2];

fn matrix(with_bias: bool) -> Vec<Vec<f32>> {
    let mut rows: Vec<Vec<f32>> = WEIGHTS.iter().map(|r| r.to_vec()).collect();
    if with_bias {
        rows.push(BIAS.to_vec());
    }
    rows
}

fn round2(values: &[f32]) -> Vec<f32> {
    values.iter().map(|v| (v * 100.0).round() / 100.0).collect()
}

fn assert_table(net: &Net, table: &[([f32; 2], [f32; 2])]) {
    for (input, expected) in table {
        let actual = round2(&net.calc(input).unwrap());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{input:?}: {actual:?} vs {expected:?}");
        }
    }
}

#[test]
fn linear_layer_without_bias() {
    let net = Net::from_matrices(2, &[(Activation::Identity, matrix(false))]).unwrap();
    assert_table(&net, &[([1.0, 1.0], [0.7, 0.9]), ([2.0, 1.0], [0.9, 1.5])]);
}

#[test]
fn linear_layer_with_bias_row() {
    let net = Net::from_matrices(2, &[(Activation::Identity, matrix(true))]).unwrap();
    assert_table(
        &net,
        &[
            ([0.0, 0.0], [0.1, 0.2]),
            ([1.0, 1.0], [0.8, 1.1]),
            ([2.0, 1.0], [1.0, 1.7]),
        ],
    );
}

#[test]
fn zero_input_returns_the_bias_exactly() {
    let layer = Layer::from_parts(3, 2, Activation::Identity, vec![0.7; 6], Some(BIAS.to_vec()))
        .unwrap();
    let net = Net::from_layers(vec![layer]).unwrap();
    assert_eq!(net.calc(&[0.0, 0.0, 0.0]).unwrap(), BIAS);
}

#[test]
fn sigmoid_layer_with_bias_row() {
    let net = Net::from_matrices(2, &[(Activation::Sigmoid, matrix(true))]).unwrap();
    assert_table(
        &net,
        &[
            ([0.0, 0.0], [0.52, 0.55]),
            ([1.0, 1.0], [0.69, 0.75]),
            ([2.0, 1.0], [0.73, 0.85]),
        ],
    );
}

#[test]
fn sigmoid_then_relu() {
    let net = Net::from_matrices(
        2,
        &[
            (Activation::Sigmoid, matrix(true)),
            (Activation::ReLU, matrix(true)),
        ],
    )
    .unwrap();
    assert_table(
        &net,
        &[
            ([0.0, 0.0], [0.48, 0.68]),
            ([1.0, 1.0], [0.61, 0.84]),
            ([2.0, 1.0], [0.67, 0.89]),
        ],
    );
}

#[test]
fn one_step_lowers_the_squared_error() {
    let net = Net::from_matrices(
        2,
        &[
            (Activation::Identity, matrix(false)),
            (Activation::ReLU, matrix(false)),
        ],
    )
    .unwrap();
    let input = [1.0_f32, 1.0];
    let target = [1.0_f32, 0.5];

    let squared = |net: &Net| -> f32 {
        net.calc(&input)
            .unwrap()
            .iter()
            .zip(target)
            .map(|(y, t)| (y - t) * (y - t))
            .sum()
    };

    let trained = net.train(&input, &target, 0.1).unwrap();
    assert!(squared(&trained) < squared(&net));
}

#[test]
fn doubling_weight_reaches_two() {
    let mut net = Net::from_matrices(1, &[(Activation::Identity, vec![vec![0.8]])]).unwrap();

    let once = net.train(&[2.0], &[4.0], 0.1).unwrap();
    assert!(once.layers()[0].weights()[0] > 0.8);

    for _ in 0..11 {
        net = net.train(&[2.0], &[4.0], 0.1).unwrap();
    }
    assert!((net.layers()[0].weights()[0] - 2.0).abs() < 0.005);
}

#[test]
fn init_layer_counts_and_folded_widths() {
    for hidden in [vec![], vec![3], vec![4, 4], vec![5, 2, 7]] {
        let options = NetOptions {
            seed: Some(1),
            ..Default::default()
        };
        let net = init(2, 3, &hidden, &options).unwrap();
        assert_eq!(net.num_layers(), hidden.len() + 1);

        let mut in_dim = 2;
        for (layer, &out) in net.layers().iter().zip(hidden.iter().chain([3].iter())) {
            assert_eq!((layer.in_dim(), layer.out_dim()), (in_dim, out));
            let folded = layer.to_matrix();
            assert_eq!(folded.len(), in_dim + 1);
            assert!(folded.iter().all(|row| row.len() == out));
            in_dim = out;
        }
    }
}

#[test]
fn mismatched_shapes_are_rejected_before_computation() {
    // Second layer expects 3 inputs but the first one produces 2.
    let first = Layer::from_matrix(2, Activation::Identity, &matrix(false)).unwrap();
    let second = Layer::from_parts(3, 1, Activation::Identity, vec![1.0; 3], None).unwrap();
    assert!(matches!(
        Net::from_layers(vec![first, second]),
        Err(Error::InvalidShape(_))
    ));

    // Row count that is neither in_dim nor in_dim + 1.
    let bad = Net::from_matrices(2, &[(Activation::Identity, vec![vec![1.0, 1.0]; 4])]);
    assert!(matches!(bad, Err(Error::InvalidShape(_))));

    let net = Net::from_matrices(2, &[(Activation::Identity, matrix(true))]).unwrap();
    assert!(matches!(net.calc(&[1.0, 2.0, 3.0]), Err(Error::InvalidShape(_))));
    assert!(matches!(
        net.train(&[1.0, 2.0], &[1.0], 0.1),
        Err(Error::InvalidShape(_))
    ));

    let wrong_targets = Dataset::from_rows(&[vec![1.0, 2.0]], &[vec![1.0, 2.0, 3.0]]).unwrap();
    assert!(matches!(
        net.train_set(&wrong_targets, 0.1, Shuffle::None),
        Err(Error::InvalidShape(_))
    ));
}

#[test]
fn fit_learns_or() {
    let data = Dataset::from_rows(
        &[vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        &[vec![0.0], vec![1.0], vec![1.0], vec![1.0]],
    )
    .unwrap();
    let options = NetOptions {
        seed: Some(5),
        activations: ActivationOptions {
            output_layer: Some(Activation::Sigmoid),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut net = init(2, 1, &[], &options).unwrap();

    let report = net
        .fit(
            &data,
            FitConfig {
                max_epochs: 10_000,
                learning_rate: Some(0.5),
                precision: Some(0.2),
                shuffle: Shuffle::Seeded(1),
                log_every: Some(1000),
            },
        )
        .unwrap();

    assert!(report.converged, "{report:?}");
    assert!(net.max_error(&data).unwrap() <= 0.2);
    for (input, target) in data.iter() {
        let y = net.calc(input).unwrap()[0];
        assert_eq!(y.round(), target[0], "{input:?} -> {y}");
    }
}

#[test]
fn train_set_leaves_the_receiver_unchanged() {
    let options = NetOptions {
        seed: Some(2),
        activations: ActivationOptions {
            all_layers: Some(Activation::Sigmoid),
            ..Default::default()
        },
        ..Default::default()
    };
    let net = init(2, 1, &[4, 4], &options).unwrap();
    let data = Dataset::from_rows(
        &[vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        &[vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
    .unwrap();

    let before = net.layers().to_vec();
    let trained = net.train_set(&data, 0.1, Shuffle::Random).unwrap();
    assert_eq!(net.layers(), before.as_slice());
    assert_ne!(trained.layers(), before.as_slice());
}

#[test]
fn placeholder_derivatives_train_without_errors() {
    // Binary step hidden layer feeding a softmax output.
    let net = Net::from_matrices(
        2,
        &[
            (Activation::Binary, matrix(true)),
            (Activation::Softmax, matrix(true)),
        ],
    )
    .unwrap();
    let input = [1.0_f32, 1.0];
    let target = [0.0_f32, 1.0];

    let mut trainer = net.trainer();
    let actual = net.forward(&input, &mut trainer.scratch).to_vec();
    loss::output_error(&actual, &target, trainer.grads.d_output_mut());
    net.backward(&input, &trainer.scratch, &mut trainer.grads);

    // Softmax passes the output error through unchanged: delta = 1 * (actual - expected).
    let out_delta = trainer.grads.delta(1);
    for k in 0..2 {
        assert!((out_delta[k] - (actual[k] - target[k])).abs() < 1e-6);
    }

    // The binary pre-activations are 0.8 and 1.1, where the step's gradient is 1.
    let w = net.layers()[1].weights();
    let hidden_delta = trainer.grads.delta(0);
    for i in 0..2 {
        let expected = w[i] * out_delta[0] + w[2 + i] * out_delta[1];
        assert!((hidden_delta[i] - expected).abs() < 1e-6);
    }

    let trained = net.train(&input, &target, 0.1).unwrap();
    let y = trained.calc(&input).unwrap();
    assert!(y.iter().all(|v| v.is_finite()));
    assert!((y.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert_ne!(trained.layers(), net.layers());

    let data = Dataset::from_rows(&[input.to_vec()], &[target.to_vec()]).unwrap();
    assert!(net.train_set(&data, 0.1, Shuffle::None).is_ok());
}

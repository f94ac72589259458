use criterion::{Criterion, black_box, criterion_group, criterion_main};

use fc_net::{Activation, Inputs, Net, NetBuilder, loss};

fn bench_net() -> Net {
    NetBuilder::from_sizes(
        &[128, 256, 256, 10],
        &[Activation::ReLU, Activation::ReLU, Activation::Sigmoid],
    )
    .and_then(|b| b.build_with_seed(0))
    .expect("valid bench net")
}

fn forward_bench(c: &mut Criterion) {
    let net = bench_net();
    let mut scratch = net.scratch();
    let input = vec![0.1_f32; net.input_dim()];

    c.bench_function("forward_128_256_256_10", |b| {
        b.iter(|| {
            let out = net.forward(black_box(&input), &mut scratch);
            black_box(out);
        })
    });
}

fn backward_bench(c: &mut Criterion) {
    let net = bench_net();
    let mut scratch = net.scratch();
    let mut grads = net.gradients();
    let input = vec![0.1_f32; net.input_dim()];
    let target = vec![0.0_f32; net.output_dim()];

    net.forward(&input, &mut scratch);
    loss::output_error(scratch.output(), &target, grads.d_output_mut());

    c.bench_function("backward_128_256_256_10", |b| {
        b.iter(|| {
            let d_input = net.backward(black_box(&input), black_box(&scratch), &mut grads);
            black_box(d_input);
        })
    });
}

fn train_step_bench(c: &mut Criterion) {
    let mut net = bench_net();
    let mut trainer = net.trainer();
    let input = vec![0.1_f32; net.input_dim()];
    let target = vec![0.5_f32; net.output_dim()];

    c.bench_function("train_step_128_256_256_10", |b| {
        b.iter(|| black_box(net.train_step(black_box(&input), &target, 1e-3, &mut trainer)))
    });
}

fn calc_batch_bench(c: &mut Criterion) {
    let net = bench_net();
    let inputs = Inputs::from_flat(vec![0.1_f32; 64 * net.input_dim()], net.input_dim())
        .expect("valid bench inputs");

    c.bench_function("calc_inputs_64x128", |b| {
        b.iter(|| black_box(net.calc_inputs(black_box(&inputs))))
    });
}

criterion_group!(
    benches,
    forward_bench,
    backward_bench,
    train_step_bench,
    calc_batch_bench
);
criterion_main!(benches);

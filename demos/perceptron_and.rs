use fc_net::{Inputs, Perceptron};

fn main() -> fc_net::Result<()> {
    let inputs = Inputs::from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])?;
    let targets = [0.0_f32, 0.0, 0.0, 1.0];

    // Per-sample rule.
    let mut p = Perceptron::new_with_seed(2, 0)?;
    for epoch in 0..100 {
        let before = p.clone();
        for (i, &t) in targets.iter().enumerate() {
            p = p.train(inputs.input(i), t, 0.1)?;
        }
        if p == before {
            println!("per-sample rule settled after {epoch} epochs");
            break;
        }
    }
    println!("weights={:?} bias={:.2}", p.weights(), p.bias());
    println!("outputs={:?}", p.calc_batch(&inputs)?);

    // Averaged batch rule.
    let mut q = Perceptron::new_with_seed(2, 0)?;
    for _ in 0..500 {
        q = q.train_batch(&inputs, &targets, 0.1)?;
    }
    println!("batch rule outputs={:?}", q.calc_batch(&inputs)?);

    Ok(())
}

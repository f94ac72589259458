use fc_net::{Activation, Net};

fn main() -> fc_net::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // One linear neuron without bias, learning y = 2x from the single sample (2, 4).
    let mut net = Net::from_matrices(1, &[(Activation::Identity, vec![vec![0.8]])])?;

    for step in 1..=11 {
        net = net.train(&[2.0], &[4.0], 0.1)?;
        println!("step {step:>2}: w={:.5}", net.layers()[0].weights()[0]);
    }

    println!("3 * w = {:?}", net.calc(&[3.0])?);
    Ok(())
}

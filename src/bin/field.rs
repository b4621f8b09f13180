extern crate itertools;
extern crate neuralfield;
extern crate rand;

use itertools::Itertools;
use neuralfield::layers::{Gaussian, Stimulus};
use neuralfield::{Network, Result};
use rand::Rng;
use std::cmp::Ordering;

const SIZE: usize = 100;
const STEPS: usize = 200;

/// A Gaussian bump centered on the stimulus position, buried in uniform
/// noise.
fn noisy_bump(stimulus: &Stimulus, out: &mut [f64]) {
    let center = match *stimulus {
        Stimulus::Scalar(x) => x,
        Stimulus::Values(ref values) => values.first().cloned().unwrap_or(0.0),
    };
    let mut rng = rand::thread_rng();
    for (i, y) in out.iter_mut().enumerate() {
        let d = i as f64 - center;
        *y = (-d * d / (2.0 * 5.0 * 5.0)).exp() + rng.gen_range(-0.5..0.5);
    }
}

fn build() -> Result<Network> {
    let mut net = Network::new();
    let input = net.input_with("input", SIZE, noisy_bump)?;
    let h = net.constant("h", SIZE, -0.1)?;
    let fu = net.function("fu", SIZE, "relu")?;
    let exc = net.gaussian("gexc", SIZE, Gaussian::new(1.5, 3.0).toric(true))?;
    let inh = net.gaussian("ginh", SIZE, Gaussian::new(-1.0, 15.0).toric(true))?;
    let u = net.leaky_integrator("u", SIZE, 0.1)?;

    net.connect(fu, exc)?;
    net.connect(fu, inh)?;
    let total = net.sum_of(&[input, h, exc, inh])?;
    net.connect(total, u)?;
    net.connect_delayed(u, fu)?;

    net.init()?;
    net.set_input(input, (SIZE as f64 / 3.0).into())?;
    Ok(net)
}

fn main() {
    env_logger::init();

    let mut net = match build() {
        Ok(net) => net,
        Err(e) => {
            eprintln!("failed to build the field: {}", e);
            std::process::exit(1);
        }
    };
    print!("{}", net);

    for _ in 0..STEPS {
        if let Err(e) = net.step() {
            eprintln!("step failed: {}", e);
            std::process::exit(1);
        }
    }

    let u = net.get("u").map(|id| net.buffer(id)).unwrap_or(&[]);
    let peak = u
        .iter()
        .position_max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    println!();
    if let Some(i) = peak {
        println!("after {} steps, u peaks at {} with {:.3}", STEPS, i, u[i]);
    }
    for x in u {
        print!("{:.3} ", x);
    }
    println!();
}

use grid_traffic::{Simulation, SimulationConfig};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(seed) => SimulationConfig {
            seed: Some(seed.parse()?),
            ..Default::default()
        },
        None => SimulationConfig::default(),
    };

    let mut sim = Simulation::random(config)?;
    sim.populate()?;

    println!("Simulating...");
    const NUM_FRAMES: u32 = 600;
    loop {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            sim.step()?;
        }
        let frame = start.elapsed() / NUM_FRAMES;
        let idle = sim.iter_vehicles().filter(|v| v.is_idle()).count();
        println!(
            "Avg. frame: {:?} --> {:.0} fps ({} vehs, {} at dead ends)",
            frame,
            1.0 / frame.as_secs_f64(),
            sim.iter_vehicles().count(),
            idle,
        )
    }
}

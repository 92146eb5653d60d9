use xscat::settings::{self};
use xscat::simulation::Simulation;

fn main() {
    let settings = settings::load_config().unwrap();
    let mut simulation = Simulation::new(settings).unwrap();

    simulation.run();
    simulation.writeup();
}

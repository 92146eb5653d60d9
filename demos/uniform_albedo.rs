use nalgebra::{Point3, Vector3};
use xscat::detector::{DetectorGrid, PlaneSurface};
use xscat::materials::{MuChannels, UniformMedium};
use xscat::rng::Ranecu;
use xscat::spectrum::Spectrum;
use xscat::tally::Tally;
use xscat::transport::Transport;
use xscat::volume::Volume;

fn main() {
    let channels = MuChannels {
        rayleigh: 0.05,
        compton: 0.25,
        photoelectric: 0.2,
    };
    let medium = UniformMedium::new(channels, 1.0).unwrap();
    let volume = Volume::new(
        Point3::new(-5.0, -5.0, -5.0),
        [10, 10, 10],
        [1.0, 1.0, 1.0],
        vec![1; 1000],
    )
    .unwrap();
    let spectrum = Spectrum::from_weights(vec![60_000.0], &[1.0]).unwrap();
    let plane = PlaneSurface::new(
        Point3::new(-20.0, -20.0, 30.0),
        Vector3::new(0.2, 0.0, 0.0),
        Vector3::new(0.0, 0.2, 0.0),
        200,
        200,
    )
    .unwrap();
    let grid = DetectorGrid::new(200, 200);

    let transport = Transport {
        source: Point3::new(0.0, 0.0, -8.0),
        spectrum: &spectrum,
        volume: &volume,
        materials: &medium,
        plane: &plane,
        grid: &grid,
        absorption_energy: 5_000.0,
    };

    let master = Ranecu::from_master(2024);
    let mut tally = Tally::new();
    for index in 0..200_000 {
        let mut rng = master.for_photon(index);
        transport.trace(&mut rng, &mut tally);
    }

    let events =
        (tally.rayleigh_events + tally.compton_events + tally.photoelectric_events) as f64;
    let share = (tally.rayleigh_events + tally.compton_events) as f64 / events;
    let expected = (channels.rayleigh + channels.compton) / channels.total();

    println!("{}", tally);
    println!(
        "scatter share: {:.4} (cross sections give {:.4})",
        share, expected
    );
}

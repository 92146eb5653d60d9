use nalgebra::{Point3, Vector3};
use xscat::detector::{DetectorGrid, PlaneSurface};
use xscat::materials::MaterialLibrary;
use xscat::rng::Ranecu;
use xscat::spectrum::Spectrum;
use xscat::tally::Tally;
use xscat::transport::Transport;
use xscat::volume::Volume;

fn main() {
    let spectrum = Spectrum::filtered_demo(20_000.0, 140_000.0, 64).unwrap();
    let materials = MaterialLibrary::analytic_demo(spectrum.max_energy()).unwrap();
    let volume = Volume::slab_phantom([40, 40, 40], [0.5, 0.5, 0.5]);
    let plane = PlaneSurface::new(
        Point3::new(-20.0, -20.0, 45.0),
        Vector3::new(0.1, 0.0, 0.0),
        Vector3::new(0.0, 0.1, 0.0),
        400,
        400,
    )
    .unwrap();
    let grid = DetectorGrid::new(400, 400);

    let transport = Transport {
        source: Point3::new(0.0, 0.0, -12.0),
        spectrum: &spectrum,
        volume: &volume,
        materials: &materials,
        plane: &plane,
        grid: &grid,
        absorption_energy: 5_000.0,
    };

    let master = Ranecu::from_master(7);
    let mut tally = Tally::new();
    for index in 0..20 {
        let mut rng = master.for_photon(index);
        let outcome = transport.trace(&mut rng, &mut tally);
        println!("photon {:>2}: {:?}", index, outcome);
    }

    println!("{}", tally);
}

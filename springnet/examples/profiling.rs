use ndarray::Array1;

use springnet::{Anm, Error, ForceField, SimpleSystem, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n_residues = match std::env::args().nth(1) {
        Some(value) => value.parse()?,
        None => 300,
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    // run the calculation
    let bfactors = compute_bfactors(n_residues)?;
    println!("B-factors of the first residues: {:.3}", bfactors.slice(ndarray::s![..5]));

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Springs with a constant of 1 between all residues closer than 13 A
struct ConstantSprings;

impl ForceField for ConstantSprings {
    fn cutoff_distance(&self) -> Option<f64> {
        Some(13.0)
    }

    fn force_constant(&self, atom_i: &[usize], _: &[usize], _: &[f64]) -> Result<Array1<f64>, Error> {
        Ok(Array1::ones(atom_i.len()))
    }
}

/// Compute the B-factors of the CA atoms in an ideal alpha helix
fn compute_bfactors(n_residues: usize) -> Result<Array1<f64>, Box<dyn std::error::Error>> {
    let mut system = SimpleSystem::new();
    for i in 0..n_residues {
        let angle = (100.0 * i as f64).to_radians();
        system.add_atom("ALA", Vector3D::new(
            2.3 * f64::cos(angle),
            2.3 * f64::sin(angle),
            1.5 * i as f64,
        ));
    }

    let bfactors = time_graph::spanned!("Full calculation", {
        let mut anm = Anm::new(Box::new(system), Box::new(ConstantSprings), true)?;
        anm.bfactor()?
    });

    Ok(bfactors)
}

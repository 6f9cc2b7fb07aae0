#![allow(dead_code)]

use ndarray::{Array1, Array2};

use springnet::{Error, ForceField, SimpleSystem, Vector3D};

/// Force field using the same force constant for all pairs within the cutoff
pub struct UniformForceField {
    pub cutoff: Option<f64>,
    pub constant: f64,
}

impl ForceField for UniformForceField {
    fn cutoff_distance(&self) -> Option<f64> {
        self.cutoff
    }

    fn force_constant(&self, atom_i: &[usize], _: &[usize], _: &[f64]) -> Result<Array1<f64>, Error> {
        Ok(Array1::from_elem(atom_i.len(), self.constant))
    }
}

/// Force field where the force constant decays as `1 / r^2`, without cutoff
pub struct InverseSquareForceField;

impl ForceField for InverseSquareForceField {
    fn cutoff_distance(&self) -> Option<f64> {
        None
    }

    fn force_constant(&self, _: &[usize], _: &[usize], sq_distance: &[f64]) -> Result<Array1<f64>, Error> {
        Ok(sq_distance.iter().map(|r2| 1.0 / r2).collect())
    }
}

/// Four atoms on the corners of a right tetrahedron
pub fn tetrahedron() -> SimpleSystem {
    let mut system = SimpleSystem::new();
    system.add_atom("GLY", Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom("ALA", Vector3D::new(1.0, 0.0, 0.0));
    system.add_atom("SER", Vector3D::new(0.0, 1.0, 0.0));
    system.add_atom("GLY", Vector3D::new(0.0, 0.0, 1.0));
    return system;
}

/// CA atoms of an ideal alpha helix with `n_residues` residues
pub fn helix(n_residues: usize) -> SimpleSystem {
    let residues = ["ALA", "GLU", "LEU", "LYS", "ARG", "GLN", "MET", "TRP"];

    let mut system = SimpleSystem::new();
    for i in 0..n_residues {
        let angle = (100.0 * i as f64).to_radians();
        system.add_atom(residues[i % residues.len()], Vector3D::new(
            2.3 * f64::cos(angle),
            2.3 * f64::sin(angle),
            1.5 * i as f64,
        ));
    }
    return system;
}

/// A compact, deterministic chain of `n_atoms` CA atoms filling a cube,
/// with consecutive atoms 3.8 A apart
pub fn globule(n_atoms: usize) -> SimpleSystem {
    let side = f64::ceil(f64::cbrt(n_atoms as f64)) as usize;

    let mut system = SimpleSystem::new();
    let mut count = 0;
    'outer: for x in 0..side {
        for y in 0..side {
            for z in 0..side {
                if count == n_atoms {
                    break 'outer;
                }
                // boustrophedon path through the lattice
                let y = if x % 2 == 0 { y } else { side - 1 - y };
                let z = if (x * side + y) % 2 == 0 { z } else { side - 1 - z };

                let jitter = 0.3 * f64::sin(count as f64 * 1.7);
                system.add_atom("GLY", Vector3D::new(
                    3.8 * x as f64 + jitter,
                    3.8 * y as f64 - jitter,
                    3.8 * z as f64 + 0.5 * jitter,
                ));
                count += 1;
            }
        }
    }
    return system;
}

/// Get the positions of all atoms in `system` as an array with shape `(n, 3)`
pub fn coordinates(system: &SimpleSystem) -> Array2<f64> {
    use springnet::System;

    let positions = system.positions().expect("failed to get positions");
    let mut coordinates = Array2::zeros((positions.len(), 3));
    for (i, position) in positions.iter().enumerate() {
        coordinates[[i, 0]] = position[0];
        coordinates[[i, 1]] = position[1];
        coordinates[[i, 2]] = position[2];
    }
    return coordinates;
}

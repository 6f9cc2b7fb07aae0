use ndarray::{Array1, Array2};

use crate::{Error, ForceField, Vector3D};
use super::SimpleSystem;

/// Force field with the same force constant for all pairs
#[derive(Debug, Clone)]
pub struct UniformForceField {
    cutoff: Option<f64>,
    natoms: Option<usize>,
    constant: f64,
}

impl UniformForceField {
    pub fn with_cutoff(cutoff: f64) -> UniformForceField {
        UniformForceField {
            cutoff: Some(cutoff),
            natoms: None,
            constant: 1.0,
        }
    }

    pub fn without_cutoff() -> UniformForceField {
        UniformForceField {
            cutoff: None,
            natoms: None,
            constant: 1.0,
        }
    }

    pub fn with_constant(mut self, constant: f64) -> UniformForceField {
        self.constant = constant;
        self
    }

    pub fn with_natoms(mut self, natoms: usize) -> UniformForceField {
        self.natoms = Some(natoms);
        self
    }
}

impl ForceField for UniformForceField {
    fn natoms(&self) -> Option<usize> {
        self.natoms
    }

    fn cutoff_distance(&self) -> Option<f64> {
        self.cutoff
    }

    fn force_constant(&self, atom_i: &[usize], _: &[usize], _: &[f64]) -> Result<Array1<f64>, Error> {
        Ok(Array1::from_elem(atom_i.len(), self.constant))
    }
}

pub fn test_system(name: &str) -> SimpleSystem {
    match name {
        "tetrahedron" => get_tetrahedron(),
        "helix" => get_helix(),
        _ => panic!("unknown test system {}", name)
    }
}

pub fn test_coordinates(name: &str) -> Array2<f64> {
    let system = test_system(name);
    return super::coordinates(&system).expect("failed to get coordinates");
}

/// Four atoms on the corners of a right tetrahedron, all within 1.5 of one
/// another
fn get_tetrahedron() -> SimpleSystem {
    let mut system = SimpleSystem::new();
    system.add_atom("GLY", Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom("ALA", Vector3D::new(1.0, 0.0, 0.0));
    system.add_atom("SER", Vector3D::new(0.0, 1.0, 0.0));
    system.add_atom("GLY", Vector3D::new(0.0, 0.0, 1.0));
    return system;
}

/// CA atoms of an ideal alpha helix with 12 residues: 100° and 1.5 A rise per
/// residue, on a cylinder of radius 2.3 A
fn get_helix() -> SimpleSystem {
    let residues = [
        "MET", "ALA", "LYS", "GLU", "LEU", "ALA", "GLU", "ARG", "LEU", "GLY", "TRP", "VAL",
    ];

    let mut system = SimpleSystem::new();
    for (i, residue) in residues.iter().enumerate() {
        let angle = (100.0 * i as f64).to_radians();
        system.add_atom(*residue, Vector3D::new(
            2.3 * f64::cos(angle),
            2.3 * f64::sin(angle),
            1.5 * i as f64,
        ));
    }
    return system;
}

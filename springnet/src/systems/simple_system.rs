use ndarray::{Array2, ArrayView2};

use crate::Error;

use super::{System, Vector3D};

/// A simple implementation of `System` to use when no other is available
#[derive(Clone, Debug, Default)]
pub struct SimpleSystem {
    residues: Vec<String>,
    positions: Vec<Vector3D>,
}

impl SimpleSystem {
    /// Create a new empty system
    pub fn new() -> SimpleSystem {
        SimpleSystem {
            residues: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Create a system from an array of coordinates with shape `(n, 3)`. The
    /// resulting system does not contain residue names, and can not be used
    /// to compute mass-weighted quantities.
    pub fn from_coordinates(coordinates: ArrayView2<'_, f64>) -> Result<SimpleSystem, Error> {
        if coordinates.ncols() != 3 {
            return Err(Error::InvalidParameter(format!(
                "expected coordinates with shape (n, 3), got {:?}", coordinates.shape()
            )));
        }

        let positions = coordinates.rows().into_iter()
            .map(|row| Vector3D::new(row[0], row[1], row[2]))
            .collect();

        Ok(SimpleSystem {
            residues: Vec::new(),
            positions: positions,
        })
    }

    /// Add an atom belonging to the residue with the given name and position
    /// to this system
    pub fn add_atom(&mut self, residue: impl Into<String>, position: Vector3D) {
        self.residues.push(residue.into());
        self.positions.push(position);
    }
}

impl System for SimpleSystem {
    fn size(&self) -> Result<usize, Error> {
        Ok(self.positions.len())
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        Ok(&self.positions)
    }

    fn residue_names(&self) -> Result<&[String], Error> {
        if self.residues.len() != self.positions.len() {
            return Err(Error::InvalidParameter(
                "this system does not define residue names for all atoms".into()
            ));
        }
        Ok(&self.residues)
    }
}

/// Get the positions of all atoms in `system` as an array with shape `(n, 3)`
pub(crate) fn coordinates(system: &dyn System) -> Result<Array2<f64>, Error> {
    let positions = system.positions()?;
    let mut coordinates = Array2::zeros((positions.len(), 3));
    for (mut row, position) in coordinates.rows_mut().into_iter().zip(positions) {
        row[0] = position[0];
        row[1] = position[1];
        row[2] = position[2];
    }
    return Ok(coordinates);
}

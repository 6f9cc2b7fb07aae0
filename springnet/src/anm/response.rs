use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayViewD, Ix1, Ix2};

use crate::Error;

use super::Anm;

impl Anm {
    /// Compute the displacement of the atoms induced by the given `force`,
    /// using linear response theory.
    ///
    /// The force can either be given with shape `(n, 3)`, or flattened as
    /// `[x1, y1, z1, ... xn, yn, zn]` with shape `(3n,)`. The displacement is
    /// returned with shape `(n, 3)`.
    pub fn linear_response(&mut self, force: ArrayViewD<'_, f64>) -> Result<Array2<f64>, Error> {
        let n_atoms = self.n_atoms;
        let force = match force.ndim() {
            2 => {
                let force = force.into_dimensionality::<Ix2>()?;
                if force.shape() != [n_atoms, 3] {
                    return Err(Error::InvalidParameter(format!(
                        "expected force with shape [{}, 3], got {:?}", n_atoms, force.shape()
                    )));
                }
                force.iter().copied().collect::<Array1<f64>>()
            }
            1 => {
                let force = force.into_dimensionality::<Ix1>()?;
                if force.len() != 3 * n_atoms {
                    return Err(Error::InvalidParameter(format!(
                        "expected force with length {}, got {}", 3 * n_atoms, force.len()
                    )));
                }
                force.to_owned()
            }
            ndim => {
                return Err(Error::InvalidParameter(format!(
                    "expected a force array with 1 or 2 dimensions, got {} dimensions", ndim
                )));
            }
        };

        let displacement = self.covariance()?.dot(&force);
        return Ok(displacement.into_shape_with_order((n_atoms, 3))?);
    }

    /// Compute the mean square fluctuation of each atom, i.e. the trace of
    /// the corresponding 3x3 diagonal block of the covariance matrix.
    pub fn mean_square_fluctuation(&mut self) -> Result<Array1<f64>, Error> {
        let n_atoms = self.n_atoms;
        let covariance = self.covariance()?;

        let fluctuations = Array1::from_shape_fn(n_atoms, |atom| {
            (0..3).map(|a| covariance[[3 * atom + a, 3 * atom + a]]).sum()
        });
        return Ok(fluctuations);
    }

    /// Compute the B-factor (temperature factor) of each atom, as
    /// `8π²/3` times the mean square fluctuation.
    pub fn bfactor(&mut self) -> Result<Array1<f64>, Error> {
        let fluctuations = self.mean_square_fluctuation()?;
        return Ok(fluctuations * (8.0 * PI * PI / 3.0));
    }
}

use std::f64::consts::PI;

use ndarray::{Array1, Array2, Array3, Axis};

use crate::math::SymmetricEigen;
use crate::Error;

use super::Anm;

/// Normal modes of an ANM: the eigenvalues and eigenvectors of its Hessian.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct NormalModes {
    /// Eigenvalues of the Hessian, in ascending order
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors of the Hessian, normalized to one. The eigenvector for
    /// `eigenvalues[k]` is stored in `eigenvectors.row(k)`.
    pub eigenvectors: Array2<f64>,
}

/// Shape of the movement used to display a normal mode as a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    /// Sinusoidal movement of the atoms
    Sine,
    /// Linear movement of the atoms, with sharp turns at the extremes
    Triangle,
}

impl Movement {
    /// Get the displacement (between -1 and 1) at the reduced time `t`, where
    /// a full oscillation corresponds to `0 <= t < 1`.
    pub fn value(self, t: f64) -> f64 {
        match self {
            Movement::Sine => f64::sin(2.0 * PI * t),
            Movement::Triangle => 2.0 * f64::abs(2.0 * (t - f64::floor(t + 0.5))) - 1.0,
        }
    }
}

impl std::str::FromStr for Movement {
    type Err = Error;

    fn from_str(value: &str) -> Result<Movement, Error> {
        match value {
            "sine" => Ok(Movement::Sine),
            "triangle" => Ok(Movement::Triangle),
            _ => Err(Error::InvalidParameter(format!(
                "unknown movement '{}', expected 'sine' or 'triangle'", value
            ))),
        }
    }
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Movement::Sine => write!(f, "sine"),
            Movement::Triangle => write!(f, "triangle"),
        }
    }
}

impl Anm {
    /// Compute the eigenvalues and eigenvectors of the Hessian of this model.
    ///
    /// For a free three-dimensional network, the first six eigenvalues are
    /// zero (up to numerical noise), corresponding to global translations and
    /// rotations.
    pub fn eigen(&mut self) -> Result<NormalModes, Error> {
        let eigen = SymmetricEigen::new(self.hessian()?.clone())?;

        // SymmetricEigen stores eigenvectors as columns
        let eigenvectors = eigen.eigenvectors.t().as_standard_layout().into_owned();
        return Ok(NormalModes {
            eigenvalues: eigen.eigenvalues,
            eigenvectors: eigenvectors,
        });
    }

    /// Compute the frequency `sqrt(λ) / 2π` associated with each normal mode,
    /// in the same order as the eigenvalues.
    ///
    /// Eigenvalues which are slightly negative because of numerical noise
    /// give `NaN` frequencies.
    pub fn frequencies(&mut self) -> Result<Array1<f64>, Error> {
        let modes = self.eigen()?;
        return Ok(modes.eigenvalues.mapv(|value| f64::sqrt(value) / (2.0 * PI)));
    }

    /// Create the displacements of all atoms along the normal mode `index`,
    /// for a trajectory of `frames` steps covering a single oscillation.
    ///
    /// The displacements are scaled such that the largest displacement of a
    /// single atom during the oscillation is `amplitude`. The returned array
    /// has shape `(frames, n, 3)`.
    pub fn normal_mode(
        &mut self,
        index: usize,
        amplitude: f64,
        frames: usize,
        movement: Movement,
    ) -> Result<Array3<f64>, Error> {
        let modes = self.eigen()?;
        if index >= modes.eigenvalues.len() {
            return Err(Error::InvalidParameter(format!(
                "normal mode index {} is out of bounds for a model with {} modes",
                index, modes.eigenvalues.len()
            )));
        }

        let mut vectors = modes.eigenvectors.row(index)
            .to_owned()
            .into_shape_with_order((self.n_atoms, 3))?;

        let largest = vectors.rows().into_iter()
            .map(|vector| vector.dot(&vector).sqrt())
            .fold(0.0, f64::max);
        if largest > 0.0 {
            vectors *= amplitude / largest;
        }

        let mut displacements = Array3::zeros((frames, self.n_atoms, 3));
        for (frame, mut displacement) in displacements.axis_iter_mut(Axis(0)).enumerate() {
            let t = frame as f64 / frames as f64;
            displacement.assign(&(movement.value(t) * &vectors));
        }

        return Ok(displacements);
    }
}

//! Anisotropic Network Model, built on top of the Hessian of an elastic
//! network.
//!
//! The [`Anm`] lazily computes and caches the Hessian, covariance and mass
//! weights of a system, as well as the mass-weighted versions of the Hessian
//! and covariance. Any of these can also be replaced by the user, in which
//! case all the quantities computed from it are discarded.
use log::debug;
use ndarray::{Array1, Array2, Axis};

use crate::interaction::compute_hessian;
use crate::math::pseudo_inverse;
use crate::systems::{coordinates, ResidueMasses, StandardResidueMasses};
use crate::{Error, ForceField, System};

mod cache;
use self::cache::{Cache, Quantity};

mod parameters;
pub use self::parameters::AnmParameters;

mod modes;
pub use self::modes::{Movement, NormalModes};

mod response;

/// An Anisotropic Network Model, describing the harmonic fluctuations of the
/// atoms of a system around their equilibrium positions.
///
/// All matrices have shape `(3n, 3n)`, where `n` is the number of atoms, and
/// each dimension is ordered as `[x1, y1, z1, ... xn, yn, zn]`. They are
/// computed the first time they are requested and cached afterward. The
/// getters return a reference to the cached value: to modify a matrix, clone
/// it and give the modified version to the corresponding setter.
pub struct Anm {
    system: Box<dyn System>,
    force_field: Box<dyn ForceField>,
    masses: Box<dyn ResidueMasses>,
    parameters: AnmParameters,
    n_atoms: usize,
    cache: Cache,
}

impl std::fmt::Debug for Anm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anm")
            .field("n_atoms", &self.n_atoms)
            .field("parameters", &self.parameters)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Anm {
    /// Create a new ANM for the atoms in `system`, interacting with the given
    /// `force_field`. If `use_cell_list` is true, a cell list is used to find
    /// pairs of atoms within the cutoff of the force field.
    pub fn new(
        system: Box<dyn System>,
        force_field: Box<dyn ForceField>,
        use_cell_list: bool,
    ) -> Result<Anm, Error> {
        let parameters = AnmParameters {
            use_cell_list,
            ..Default::default()
        };
        return Anm::with_parameters(system, force_field, parameters);
    }

    /// Create a new ANM for the atoms in `system`, interacting with the given
    /// `force_field`, using the given `parameters`.
    pub fn with_parameters(
        system: Box<dyn System>,
        force_field: Box<dyn ForceField>,
        parameters: AnmParameters,
    ) -> Result<Anm, Error> {
        parameters.validate()?;

        let n_atoms = system.size()?;
        if system.positions()?.len() != n_atoms {
            return Err(Error::InvalidParameter(format!(
                "the system contains {} atoms, but {} positions",
                n_atoms, system.positions()?.len()
            )));
        }

        if let Some(natoms) = force_field.natoms() {
            if natoms != n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "the system contains {} atoms, but the force field was built for {} atoms",
                    n_atoms, natoms
                )));
            }
        }

        Ok(Anm {
            system,
            force_field,
            masses: Box::new(StandardResidueMasses),
            parameters,
            n_atoms,
            cache: Cache::default(),
        })
    }

    /// Use the given `masses` to get the mass of each residue, instead of
    /// the standard amino acids masses.
    pub fn with_residue_masses(mut self, masses: Box<dyn ResidueMasses>) -> Anm {
        self.masses = masses;
        self.cache.mass_weights = None;
        self.cache.invalidate_dependents(Quantity::MassWeights);
        return self;
    }

    /// Get the number of atoms in this model
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Get the parameters used by this model
    pub fn parameters(&self) -> &AnmParameters {
        &self.parameters
    }

    /// Get the system used by this model
    pub fn system(&self) -> &dyn System {
        &*self.system
    }

    fn check_matrix_shape(&self, matrix: &Array2<f64>) -> Result<(), Error> {
        let size = 3 * self.n_atoms;
        if matrix.shape() != [size, size] {
            return Err(Error::ShapeMismatch {
                expected: vec![size, size],
                got: matrix.shape().to_vec(),
            });
        }
        return Ok(());
    }

    fn build_hessian(&self) -> Result<Array2<f64>, Error> {
        let coordinates = coordinates(&*self.system)?;
        let (hessian, contacts) = compute_hessian(
            coordinates.view(),
            &*self.force_field,
            self.parameters.use_cell_list,
            &self.parameters.overrides(),
        )?;
        debug!("built the ANM Hessian from {} contacts", contacts.len());
        return Ok(hessian);
    }

    fn build_mass_weights(&self) -> Result<Array1<f64>, Error> {
        let residues = self.system.residue_names()?;
        let mut weights = Array1::zeros(3 * self.n_atoms);
        for (atom, residue) in residues.iter().enumerate() {
            let mass = self.masses.mass(residue).ok_or_else(|| Error::InvalidParameter(format!(
                "unknown mass for residue '{}' of atom {}", residue, atom
            )))?;
            weights.slice_mut(ndarray::s![3 * atom..3 * atom + 3]).fill(mass);
        }
        return Ok(weights);
    }

    /// Get the Hessian matrix of this model.
    ///
    /// If a covariance matrix was set, the Hessian is its pseudo-inverse.
    /// Otherwise, it is computed from the positions of the atoms and the
    /// force field.
    ///
    /// The returned matrix can not be modified in place:
    ///
    /// ```compile_fail
    /// # fn modify(anm: &mut springnet::Anm) -> Result<(), springnet::Error> {
    /// anm.hessian()?[[0, 0]] = 1.0;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Instead, give a modified copy to [`Anm::set_hessian`]:
    ///
    /// ```
    /// # fn modify(anm: &mut springnet::Anm) -> Result<(), springnet::Error> {
    /// let mut hessian = anm.hessian()?.clone();
    /// hessian[[0, 0]] = 1.0;
    /// anm.set_hessian(hessian)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn hessian(&mut self) -> Result<&Array2<f64>, Error> {
        let hessian = match self.cache.hessian.take() {
            Some(hessian) => hessian,
            None => match &self.cache.covariance {
                Some(covariance) => pseudo_inverse(covariance.view(), self.parameters.rcond)?,
                None => self.build_hessian()?,
            }
        };
        return Ok(self.cache.hessian.insert(hessian));
    }

    /// Set the Hessian matrix of this model. This discards the covariance
    /// and all mass-weighted matrices.
    pub fn set_hessian(&mut self, hessian: Array2<f64>) -> Result<(), Error> {
        self.check_matrix_shape(&hessian)?;
        self.cache.hessian = Some(hessian);
        self.cache.invalidate_dependents(Quantity::Hessian);
        return Ok(());
    }

    /// Get the covariance matrix of this model, i.e. the pseudo-inverse of
    /// the Hessian.
    pub fn covariance(&mut self) -> Result<&Array2<f64>, Error> {
        let covariance = match self.cache.covariance.take() {
            Some(covariance) => covariance,
            None => {
                let rcond = self.parameters.rcond;
                pseudo_inverse(self.hessian()?.view(), rcond)?
            }
        };
        return Ok(self.cache.covariance.insert(covariance));
    }

    /// Set the covariance matrix of this model. This discards the Hessian
    /// and all mass-weighted matrices.
    pub fn set_covariance(&mut self, covariance: Array2<f64>) -> Result<(), Error> {
        self.check_matrix_shape(&covariance)?;
        self.cache.covariance = Some(covariance);
        self.cache.invalidate_dependents(Quantity::Covariance);
        return Ok(());
    }

    /// Get the mass of each degree of freedom in this model, i.e. the mass
    /// of each residue repeated three times.
    pub fn mass_weights(&mut self) -> Result<&Array1<f64>, Error> {
        let weights = match self.cache.mass_weights.take() {
            Some(weights) => weights,
            None => self.build_mass_weights()?,
        };
        return Ok(self.cache.mass_weights.insert(weights));
    }

    /// Set the mass of each degree of freedom in this model. This discards
    /// the mass-weighted matrices.
    pub fn set_mass_weights(&mut self, weights: Array1<f64>) -> Result<(), Error> {
        if weights.len() != 3 * self.n_atoms {
            return Err(Error::ShapeMismatch {
                expected: vec![3 * self.n_atoms],
                got: weights.shape().to_vec(),
            });
        }
        self.cache.mass_weights = Some(weights);
        self.cache.invalidate_dependents(Quantity::MassWeights);
        return Ok(());
    }

    /// Get the mass-weighted Hessian of this model.
    ///
    /// If a mass-weighted covariance was set, this is its pseudo-inverse.
    /// Otherwise, this is the Hessian with each entry `[a, b]` multiplied by
    /// `sqrt(m_a * m_b)`.
    pub fn hessian_mw(&mut self) -> Result<&Array2<f64>, Error> {
        let hessian_mw = match self.cache.hessian_mw.take() {
            Some(hessian_mw) => hessian_mw,
            None => {
                let rcond = self.parameters.rcond;
                let inverse = self.cache.covariance_mw.as_ref()
                    .map(|covariance_mw| pseudo_inverse(covariance_mw.view(), rcond))
                    .transpose()?;
                match inverse {
                    Some(hessian_mw) => hessian_mw,
                    None => {
                        let weights = self.mass_weights()?.clone();
                        mass_weighted(self.hessian()?, &weights)
                    }
                }
            }
        };
        return Ok(self.cache.hessian_mw.insert(hessian_mw));
    }

    /// Set the mass-weighted Hessian of this model. This discards the mass
    /// weights and the mass-weighted covariance.
    pub fn set_hessian_mw(&mut self, hessian_mw: Array2<f64>) -> Result<(), Error> {
        self.check_matrix_shape(&hessian_mw)?;
        self.cache.hessian_mw = Some(hessian_mw);
        self.cache.invalidate_dependents(Quantity::HessianMw);
        return Ok(());
    }

    /// Get the mass-weighted covariance of this model.
    ///
    /// If a mass-weighted Hessian was set, this is its pseudo-inverse.
    /// Otherwise, this is the covariance with each entry `[a, b]` multiplied
    /// by `sqrt(m_a * m_b)`.
    pub fn covariance_mw(&mut self) -> Result<&Array2<f64>, Error> {
        let covariance_mw = match self.cache.covariance_mw.take() {
            Some(covariance_mw) => covariance_mw,
            None => {
                let rcond = self.parameters.rcond;
                let inverse = self.cache.hessian_mw.as_ref()
                    .map(|hessian_mw| pseudo_inverse(hessian_mw.view(), rcond))
                    .transpose()?;
                match inverse {
                    Some(covariance_mw) => covariance_mw,
                    None => {
                        let weights = self.mass_weights()?.clone();
                        mass_weighted(self.covariance()?, &weights)
                    }
                }
            }
        };
        return Ok(self.cache.covariance_mw.insert(covariance_mw));
    }

    /// Set the mass-weighted covariance of this model. This discards the
    /// mass weights and the mass-weighted Hessian.
    pub fn set_covariance_mw(&mut self, covariance_mw: Array2<f64>) -> Result<(), Error> {
        self.check_matrix_shape(&covariance_mw)?;
        self.cache.covariance_mw = Some(covariance_mw);
        self.cache.invalidate_dependents(Quantity::CovarianceMw);
        return Ok(());
    }
}

/// Multiply each entry `[a, b]` of `matrix` by `sqrt(weights[a] * weights[b])`
fn mass_weighted(matrix: &Array2<f64>, weights: &Array1<f64>) -> Array2<f64> {
    let sqrt_weights = weights.mapv(f64::sqrt);
    let column = sqrt_weights.clone().insert_axis(Axis(1));
    let row = sqrt_weights.insert_axis(Axis(0));
    return matrix * &column * &row;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array2};

    use crate::systems::test_utils::{test_system, UniformForceField};
    use crate::{ContactOverrides, SimpleSystem, Vector3D};
    use super::*;

    fn tetrahedron() -> Anm {
        let system = test_system("tetrahedron");
        let force_field = UniformForceField::with_cutoff(1.5);
        Anm::new(Box::new(system), Box::new(force_field), false).unwrap()
    }

    #[test]
    fn hessian() {
        let mut anm = tetrahedron();
        assert_eq!(anm.n_atoms(), 4);
        assert!(!anm.cache.contains(Quantity::Hessian));

        let expected = crate::compute_hessian(
            crate::systems::test_utils::test_coordinates("tetrahedron").view(),
            &UniformForceField::with_cutoff(1.5),
            false,
            &ContactOverrides::default(),
        ).unwrap().0;

        assert_eq!(anm.hessian().unwrap(), expected);
        assert!(anm.cache.contains(Quantity::Hessian));
        assert!(!anm.cache.contains(Quantity::Covariance));
    }

    #[test]
    fn covariance_is_pseudo_inverse() {
        let mut anm = tetrahedron();
        let hessian = anm.hessian().unwrap().clone();
        let covariance = anm.covariance().unwrap().clone();

        assert_eq!(covariance.shape(), [12, 12]);
        assert_relative_eq!(hessian.dot(&covariance).dot(&hessian), hessian, epsilon = 1e-10);
        assert_relative_eq!(covariance.dot(&hessian).dot(&covariance), covariance, epsilon = 1e-10);
    }

    #[test]
    fn set_hessian() {
        let mut anm = tetrahedron();
        let old_covariance = anm.covariance().unwrap().clone();
        anm.hessian_mw().unwrap();
        anm.covariance_mw().unwrap();

        let hessian = 2.0 * anm.hessian().unwrap();
        anm.set_hessian(hessian.clone()).unwrap();

        assert!(anm.cache.contains(Quantity::MassWeights));
        assert!(!anm.cache.contains(Quantity::Covariance));
        assert!(!anm.cache.contains(Quantity::HessianMw));
        assert!(!anm.cache.contains(Quantity::CovarianceMw));

        assert_eq!(anm.hessian().unwrap(), hessian);
        assert_relative_eq!(anm.covariance().unwrap(), &(0.5 * &old_covariance), epsilon = 1e-10);

        let error = anm.set_hessian(Array2::zeros((3, 3))).unwrap_err();
        assert_eq!(error.to_string(), "shape mismatch: expected shape [12, 12], got [3, 3]");
    }

    #[test]
    fn set_covariance() {
        let mut anm = tetrahedron();
        let hessian = anm.hessian().unwrap().clone();
        let covariance = anm.covariance().unwrap().clone();

        anm.set_covariance(covariance.clone()).unwrap();
        assert!(!anm.cache.contains(Quantity::Hessian));

        // the Hessian is re-computed from the covariance
        assert_relative_eq!(anm.hessian().unwrap(), &hessian, epsilon = 1e-10);
        assert_eq!(anm.covariance().unwrap(), covariance);

        let error = anm.set_covariance(Array2::zeros((12, 11))).unwrap_err();
        assert_eq!(error.to_string(), "shape mismatch: expected shape [12, 12], got [12, 11]");
    }

    #[test]
    fn mass_weights() {
        let mut anm = tetrahedron();
        let weights = anm.mass_weights().unwrap().clone();
        assert_eq!(weights.len(), 12);

        // GLY, ALA, SER, GLY
        assert_eq!(weights.slice(ndarray::s![0..3]), array![57.0519, 57.0519, 57.0519]);
        assert_eq!(weights.slice(ndarray::s![3..6]), array![71.0788, 71.0788, 71.0788]);
        assert_eq!(weights.slice(ndarray::s![6..9]), array![87.0782, 87.0782, 87.0782]);
        assert_eq!(weights.slice(ndarray::s![9..12]), array![57.0519, 57.0519, 57.0519]);

        let error = anm.set_mass_weights(Array1::ones(4)).unwrap_err();
        assert_eq!(error.to_string(), "shape mismatch: expected shape [12], got [4]");

        // custom masses
        let masses = BTreeMap::from([
            ("GLY".to_string(), 1.0),
            ("ALA".to_string(), 2.0),
            ("SER".to_string(), 3.0),
        ]);
        let mut anm = tetrahedron().with_residue_masses(Box::new(masses));
        assert_eq!(
            anm.mass_weights().unwrap(),
            array![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn unknown_residue() {
        let mut system = SimpleSystem::new();
        system.add_atom("ALA", Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom("XYZ", Vector3D::new(1.0, 0.0, 0.0));

        let force_field = UniformForceField::with_cutoff(1.5);
        let mut anm = Anm::new(Box::new(system), Box::new(force_field), true).unwrap();

        let error = anm.mass_weights().unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: unknown mass for residue 'XYZ' of atom 1");

        // no residue names at all
        let system = SimpleSystem::from_coordinates(array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]].view()).unwrap();
        let force_field = UniformForceField::with_cutoff(1.5);
        let mut anm = Anm::new(Box::new(system), Box::new(force_field), true).unwrap();
        assert!(anm.hessian().is_ok());
        assert!(anm.hessian_mw().is_err());
    }

    #[test]
    fn mass_weighted_matrices() {
        let mut anm = tetrahedron();
        let weights = Array1::from_elem(12, 4.0);
        anm.set_mass_weights(weights).unwrap();

        // all weights are sqrt(4 * 4) = 4
        let hessian = anm.hessian().unwrap().clone();
        assert_relative_eq!(anm.hessian_mw().unwrap(), &(4.0 * &hessian), epsilon = 1e-12);

        let covariance = anm.covariance().unwrap().clone();
        assert_relative_eq!(anm.covariance_mw().unwrap(), &(4.0 * &covariance), epsilon = 1e-12);

        let weights = Array1::from_shape_fn(12, |i| (i / 3 + 1) as f64);
        let hessian_mw = mass_weighted(&hessian, &weights);
        for a in 0..12 {
            for b in 0..12 {
                let expected = hessian[[a, b]] * f64::sqrt(weights[a] * weights[b]);
                assert_relative_eq!(hessian_mw[[a, b]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn set_mass_weighted_matrices() {
        let mut anm = tetrahedron();
        anm.covariance().unwrap();
        let hessian_mw = 3.0 * anm.hessian_mw().unwrap();
        anm.covariance_mw().unwrap();

        anm.set_hessian_mw(hessian_mw.clone()).unwrap();
        assert!(anm.cache.contains(Quantity::Hessian));
        assert!(anm.cache.contains(Quantity::Covariance));
        assert!(!anm.cache.contains(Quantity::MassWeights));
        assert!(!anm.cache.contains(Quantity::CovarianceMw));

        // re-computed from the mass-weighted Hessian
        let expected = pseudo_inverse(hessian_mw.view(), 1e-6).unwrap();
        assert_relative_eq!(anm.covariance_mw().unwrap(), &expected, epsilon = 1e-12);
        assert!(!anm.cache.contains(Quantity::MassWeights));

        let covariance_mw = 2.0 * anm.covariance_mw().unwrap();
        anm.set_covariance_mw(covariance_mw.clone()).unwrap();
        assert!(anm.cache.contains(Quantity::Hessian));
        assert!(!anm.cache.contains(Quantity::HessianMw));

        let expected = pseudo_inverse(covariance_mw.view(), 1e-6).unwrap();
        assert_relative_eq!(anm.hessian_mw().unwrap(), &expected, epsilon = 1e-12);

        // mass weights are re-computed from the residues
        assert_eq!(anm.mass_weights().unwrap()[0], 57.0519);

        let error = anm.set_hessian_mw(Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(error, Error::ShapeMismatch { .. }));
        let error = anm.set_covariance_mw(Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(error, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn invalid_construction() {
        let system = test_system("tetrahedron");
        let force_field = UniformForceField::with_cutoff(1.5).with_natoms(3);
        let error = Anm::new(Box::new(system), Box::new(force_field), true).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid parameter: the system contains 4 atoms, but the force field was built for 3 atoms"
        );

        let system = test_system("tetrahedron");
        let force_field = UniformForceField::with_cutoff(1.5);
        let parameters = AnmParameters { rcond: f64::NAN, ..Default::default() };
        assert!(Anm::with_parameters(Box::new(system), Box::new(force_field), parameters).is_err());
    }

    #[test]
    fn contact_overrides() {
        let system = test_system("tetrahedron");
        let force_field = UniformForceField::with_cutoff(1.5);
        let parameters = AnmParameters {
            contact_pair_off: vec![[0, 1]],
            ..Default::default()
        };
        let mut anm = Anm::with_parameters(Box::new(system), Box::new(force_field), parameters).unwrap();

        let hessian = anm.hessian().unwrap();
        assert!(hessian.slice(ndarray::s![0..3, 3..6]).iter().all(|&v| v == 0.0));
        assert!(hessian.slice(ndarray::s![0..3, 6..9]).iter().any(|&v| v != 0.0));

        let system = test_system("tetrahedron");
        let force_field = UniformForceField::with_cutoff(1.5);
        let parameters = AnmParameters {
            contact_pair_on: vec![[1, 1]],
            ..Default::default()
        };
        let mut anm = Anm::with_parameters(Box::new(system), Box::new(force_field), parameters).unwrap();
        assert!(anm.hessian().is_err());
    }
}

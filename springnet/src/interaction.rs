//! Construction of the interaction matrices (Kirchhoff and Hessian) of an
//! elastic network.
//!
//! Both matrices are built from the same list of [`Contacts`]: the pairs of
//! atoms within the cutoff distance of the force field, patched with manual
//! [`ContactOverrides`].
use log::{debug, warn};
use ndarray::{s, Array2, Array3, Array4, ArrayView2, Axis};

use crate::systems::{CellListFinder, NeighborFinder};
use crate::{Error, ForceField, Vector3D};

/// Manual modifications of the contacts found with the cutoff distance of the
/// force field.
///
/// Overrides are symmetric: switching the pair `[i, j]` on or off also
/// switches the pair `[j, i]`. If the same pair is both switched on and off,
/// the contact is removed.
///
/// The JSON representation of overrides is part of [`AnmParameters`], as
/// `contact_pair_off` and `contact_pair_on`.
///
/// [`AnmParameters`]: crate::AnmParameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactOverrides {
    /// Pairs of atoms whose contact is removed
    pub off: Vec<[usize; 2]>,
    /// Pairs of atoms whose contact is established in any case
    pub on: Vec<[usize; 2]>,
}

impl ContactOverrides {
    /// Check that the overrides only contain valid atom indexes for a system
    /// with `n_atoms` atoms.
    fn validate(&self, n_atoms: usize) -> Result<(), Error> {
        for pair in self.off.iter().chain(&self.on) {
            if pair[0] >= n_atoms || pair[1] >= n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "contact override [{}, {}] is out of bounds for a system with {} atoms",
                    pair[0], pair[1], n_atoms
                )));
            }
        }

        for pair in &self.on {
            if pair[0] == pair[1] {
                return Err(Error::InvalidParameter(format!(
                    "can not turn on the interaction of atom {} with itself", pair[0]
                )));
            }
        }

        Ok(())
    }

    /// Apply the overrides to the given adjacency matrix
    fn apply(&self, adjacency: &mut Array2<bool>) {
        for &[i, j] in &self.on {
            adjacency[[i, j]] = true;
            adjacency[[j, i]] = true;
        }

        for &[i, j] in &self.off {
            if self.on.iter().any(|&on| on == [i, j] || on == [j, i]) {
                warn!("contact between atoms {} and {} is both switched on and off, removing it", i, j);
            }
            adjacency[[i, j]] = false;
            adjacency[[j, i]] = false;
        }
    }
}

/// Interacting pairs of atoms in an elastic network.
///
/// All pairs are included twice, as `[i, j]` and `[j, i]`, and are sorted in
/// row-major order. The three fields are index aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Contacts {
    /// Indexes of the interacting atoms
    pub pairs: Vec<[usize; 2]>,
    /// Displacement vector between the atoms in each pair, i.e.
    /// `position[j] - position[i]`
    pub displacements: Vec<Vector3D>,
    /// Squared distance between the atoms in each pair
    pub sq_distances: Vec<f64>,
}

impl Contacts {
    /// Get the number of pairs in this set of contacts
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there is no pair in this set of contacts
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn validate_coordinates(coordinates: ArrayView2<'_, f64>, force_field: &dyn ForceField) -> Result<(), Error> {
    if coordinates.ncols() != 3 {
        return Err(Error::InvalidParameter(format!(
            "expected coordinates with shape (n, 3), got {:?}", coordinates.shape()
        )));
    }

    if let Some(((atom, _), value)) = coordinates.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "coordinates of atom {} contain a non-finite value ({})", atom, value
        )));
    }

    if let Some(natoms) = force_field.natoms() {
        if natoms != coordinates.nrows() {
            return Err(Error::InvalidParameter(format!(
                "got coordinates for {} atoms, but the force field was built for {} atoms",
                coordinates.nrows(), natoms
            )));
        }
    }

    if let Some(cutoff) = force_field.cutoff_distance() {
        if cutoff.is_nan() || cutoff <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected a positive cutoff distance, got {}", cutoff
            )));
        }
    }

    Ok(())
}

fn position(coordinates: ArrayView2<'_, f64>, atom: usize) -> Vector3D {
    Vector3D::new(coordinates[[atom, 0]], coordinates[[atom, 1]], coordinates[[atom, 2]])
}

/// Find all interacting pairs of atoms at the given `coordinates` (with shape
/// `(n, 3)`), according to the cutoff of the `force_field`.
///
/// If the force field defines a cutoff and `neighbors` is `Some`, it is used
/// to find the pairs within the cutoff; otherwise all pairwise distances are
/// computed. If the force field does not define a cutoff, all pairs of
/// different atoms interact. The `overrides` are applied last.
pub fn contacts(
    coordinates: ArrayView2<'_, f64>,
    force_field: &dyn ForceField,
    neighbors: Option<&dyn NeighborFinder>,
    overrides: &ContactOverrides,
) -> Result<Contacts, Error> {
    validate_coordinates(coordinates, force_field)?;
    let n_atoms = coordinates.nrows();
    overrides.validate(n_atoms)?;

    // displacements and squared distances, when computed for all pairs
    let mut all_pairs: Option<(Array3<f64>, Array2<f64>)> = None;

    let mut adjacency = match (force_field.cutoff_distance(), neighbors) {
        (None, _) => Array2::from_elem((n_atoms, n_atoms), true),
        (Some(cutoff), Some(neighbors)) => {
            let adjacency = neighbors.adjacency_matrix(coordinates, cutoff)?;
            if adjacency.shape() != [n_atoms, n_atoms] {
                return Err(Error::Internal(format!(
                    "neighbor finder returned an adjacency matrix with shape {:?} for {} atoms",
                    adjacency.shape(), n_atoms
                )));
            }
            adjacency
        }
        (Some(cutoff), None) => {
            let mut displacements = Array3::<f64>::zeros((n_atoms, n_atoms, 3));
            let mut sq_distances = Array2::<f64>::zeros((n_atoms, n_atoms));
            for i in 0..n_atoms {
                for j in 0..n_atoms {
                    let vector = position(coordinates, j) - position(coordinates, i);
                    displacements[[i, j, 0]] = vector[0];
                    displacements[[i, j, 1]] = vector[1];
                    displacements[[i, j, 2]] = vector[2];
                    sq_distances[[i, j]] = vector * vector;
                }
            }

            let cutoff2 = cutoff * cutoff;
            let adjacency = sq_distances.mapv(|sq_distance| sq_distance <= cutoff2);
            all_pairs = Some((displacements, sq_distances));
            adjacency
        }
    };

    // atoms do not interact with themselves
    adjacency.diag_mut().fill(false);
    overrides.apply(&mut adjacency);

    let pairs = adjacency.indexed_iter()
        .filter(|(_, interacting)| **interacting)
        .map(|((i, j), _)| [i, j])
        .collect::<Vec<_>>();

    let (displacements, sq_distances): (Vec<Vector3D>, Vec<f64>) = if let Some((displacements, sq_distances)) = all_pairs {
        // re-use already computed values
        pairs.iter().map(|&[i, j]| {
            let vector = Vector3D::new(
                displacements[[i, j, 0]],
                displacements[[i, j, 1]],
                displacements[[i, j, 2]],
            );
            (vector, sq_distances[[i, j]])
        }).unzip()
    } else {
        pairs.iter().map(|&[i, j]| {
            let vector = position(coordinates, j) - position(coordinates, i);
            (vector, vector * vector)
        }).unzip()
    };

    return Ok(Contacts {
        pairs,
        displacements,
        sq_distances,
    });
}

/// Evaluate the force field for all contacts at once
fn force_constants(force_field: &dyn ForceField, contacts: &Contacts) -> Result<Vec<f64>, Error> {
    let atom_i = contacts.pairs.iter().map(|pair| pair[0]).collect::<Vec<_>>();
    let atom_j = contacts.pairs.iter().map(|pair| pair[1]).collect::<Vec<_>>();

    let constants = force_field.force_constant(&atom_i, &atom_j, &contacts.sq_distances)?;
    if constants.len() != contacts.len() {
        return Err(Error::ForceField(format!(
            "expected {} force constants, got {}", contacts.len(), constants.len()
        )));
    }

    return Ok(constants.to_vec());
}

fn default_neighbors(use_cell_list: bool) -> Option<&'static dyn NeighborFinder> {
    if use_cell_list {
        Some(&CellListFinder)
    } else {
        None
    }
}

/// Compute the *Kirchhoff* matrix for atoms with the given `coordinates` and
/// `force_field`.
///
/// If `use_cell_list` is true, a cell list is used to find atoms within the
/// cutoff distance instead of checking all pairwise distances. This is faster
/// for large systems, and is ignored if the force field does not define a
/// cutoff.
///
/// This returns the `(n, n)` Kirchhoff matrix together with the contacts
/// used to build it.
pub fn compute_kirchhoff(
    coordinates: ArrayView2<'_, f64>,
    force_field: &dyn ForceField,
    use_cell_list: bool,
    overrides: &ContactOverrides,
) -> Result<(Array2<f64>, Contacts), Error> {
    compute_kirchhoff_with_finder(coordinates, force_field, default_neighbors(use_cell_list), overrides)
}

/// Same as [`compute_kirchhoff`], using a custom `NeighborFinder` to find
/// atoms within the cutoff distance. If `neighbors` is `None`, all pairwise
/// distances are computed.
#[time_graph::instrument(name = "compute_kirchhoff")]
pub fn compute_kirchhoff_with_finder(
    coordinates: ArrayView2<'_, f64>,
    force_field: &dyn ForceField,
    neighbors: Option<&dyn NeighborFinder>,
    overrides: &ContactOverrides,
) -> Result<(Array2<f64>, Contacts), Error> {
    let contacts = contacts(coordinates, force_field, neighbors, overrides)?;
    let constants = force_constants(force_field, &contacts)?;

    let n_atoms = coordinates.nrows();
    debug!("building Kirchhoff matrix for {} atoms with {} contacts", n_atoms, contacts.len());

    let mut kirchhoff = Array2::<f64>::zeros((n_atoms, n_atoms));
    for (&[i, j], &constant) in contacts.pairs.iter().zip(&constants) {
        kirchhoff[[i, j]] = -constant;
    }

    // the diagonal makes each row sum to zero
    let row_sums = kirchhoff.sum_axis(Axis(1));
    kirchhoff.diag_mut().assign(&(-row_sums));

    return Ok((kirchhoff, contacts));
}

/// Compute the *Hessian* matrix for atoms with the given `coordinates` and
/// `force_field`.
///
/// The Hessian is a `(3n, 3n)` matrix, made of `3 x 3` blocks for each pair
/// of atoms. Each dimension is ordered as `[x1, y1, z1, ... xn, yn, zn]`.
/// See [`compute_kirchhoff`] for the meaning of `use_cell_list`.
///
/// This returns the Hessian together with the contacts used to build it.
pub fn compute_hessian(
    coordinates: ArrayView2<'_, f64>,
    force_field: &dyn ForceField,
    use_cell_list: bool,
    overrides: &ContactOverrides,
) -> Result<(Array2<f64>, Contacts), Error> {
    compute_hessian_with_finder(coordinates, force_field, default_neighbors(use_cell_list), overrides)
}

/// Same as [`compute_hessian`], using a custom `NeighborFinder` to find
/// atoms within the cutoff distance. If `neighbors` is `None`, all pairwise
/// distances are computed.
#[time_graph::instrument(name = "compute_hessian")]
pub fn compute_hessian_with_finder(
    coordinates: ArrayView2<'_, f64>,
    force_field: &dyn ForceField,
    neighbors: Option<&dyn NeighborFinder>,
    overrides: &ContactOverrides,
) -> Result<(Array2<f64>, Contacts), Error> {
    let contacts = contacts(coordinates, force_field, neighbors, overrides)?;
    let constants = force_constants(force_field, &contacts)?;

    let n_atoms = coordinates.nrows();
    debug!("building Hessian matrix for {} atoms with {} contacts", n_atoms, contacts.len());

    // the Hessian has 3x3 matrices as super-elements
    let mut blocks = Array4::<f64>::zeros((n_atoms, n_atoms, 3, 3));
    let iter = contacts.pairs.iter()
        .zip(&contacts.displacements)
        .zip(&contacts.sq_distances)
        .zip(&constants);

    for (((&[i, j], &displacement), &sq_distance), &constant) in iter {
        if sq_distance == 0.0 {
            return Err(Error::InvalidParameter(format!(
                "atoms {} and {} are at the same position, their interaction in the Hessian is undefined",
                i, j
            )));
        }

        let block = (-constant / sq_distance) * displacement.tensor_product(displacement);
        let mut target = blocks.slice_mut(s![i, j, .., ..]);
        for a in 0..3 {
            for b in 0..3 {
                target[[a, b]] = block[a][b];
            }
        }
    }

    // diagonal blocks make each row of blocks sum to zero
    let row_sums = blocks.sum_axis(Axis(1));
    for i in 0..n_atoms {
        blocks.slice_mut(s![i, i, .., ..]).assign(&(-&row_sums.slice(s![i, .., ..])));
    }

    // (n, n, 3, 3) => (n, 3, n, 3) => (3n, 3n)
    let hessian = blocks.permuted_axes([0, 2, 1, 3])
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((3 * n_atoms, 3 * n_atoms))?;

    return Ok((hessian, contacts));
}

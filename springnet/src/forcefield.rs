use ndarray::Array1;

use crate::Error;

/// A `ForceField` defines the springs between the atoms of an elastic network.
///
/// Implementations only have to provide the force constant for a set of atom
/// pairs; the network construction takes care of finding which pairs are in
/// contact.
pub trait ForceField {
    /// Get the number of atoms this force field was built for, or `None` if
    /// it can be used with any number of atoms.
    fn natoms(&self) -> Option<usize> {
        None
    }

    /// Get the cutoff distance of this force field. Only pairs of atoms
    /// closer than this distance interact. If this is `None`, all pairs of
    /// atoms interact.
    fn cutoff_distance(&self) -> Option<f64>;

    /// Get the force constants for all the pairs `(atom_i[k], atom_j[k])`,
    /// separated by the squared distance `sq_distance[k]`.
    ///
    /// All three slices have the same length, and the returned array must
    /// contain one force constant per pair, in the same order. This function
    /// is called once with all the pairs of the network.
    fn force_constant(
        &self,
        atom_i: &[usize],
        atom_j: &[usize],
        sq_distance: &[f64],
    ) -> Result<Array1<f64>, Error>;
}

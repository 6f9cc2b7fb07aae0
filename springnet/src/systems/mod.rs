use crate::{Error, Vector3D};

mod neighbors;
pub use self::neighbors::{NeighborFinder, CellListFinder, CellList, CellPair, NeighborsList};

mod simple_system;
pub use self::simple_system::SimpleSystem;
pub(crate) use self::simple_system::coordinates;

mod masses;
pub use self::masses::{ResidueMasses, StandardResidueMasses};

#[cfg(test)]
pub(crate) mod test_utils;

/// Pair of atoms coming from a neighbor list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// index of the first atom in the pair
    pub first: usize,
    /// index of the second atom in the pair
    pub second: usize,
    /// distance between the two atoms
    pub distance: f64,
    /// vector from the first atom to the second atom, i.e.
    /// `position[second] - position[first]`
    pub vector: Vector3D,
}

/// A `System` deals with the storage of atoms and related information.
///
/// Atoms in an elastic network are usually coarse-grained, with one node
/// per residue (typically the CA atom). Each atom is associated with the
/// name of its residue, which is used to get the mass of the node.
pub trait System {
    /// Get the number of atoms in this system
    fn size(&self) -> Result<usize, Error>;

    /// Get the positions for all atoms in this system. The returned value must
    /// be a slice of length `self.size()` containing the Cartesian coordinates
    /// of all atoms in the system.
    fn positions(&self) -> Result<&[Vector3D], Error>;

    /// Get the residue names for all atoms in this system. The returned value
    /// must be a slice of length `self.size()`.
    fn residue_names(&self) -> Result<&[String], Error>;
}

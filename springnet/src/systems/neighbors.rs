use log::warn;
use ndarray::{Array2, Array3, ArrayView2};

use crate::{Error, Vector3D};
use super::Pair;

/// Maximal number of cells, we need to use this to prevent having too many
/// cells with a large system and a small cutoff
const MAX_NUMBER_OF_CELLS: f64 = 1e5;

/// A `NeighborFinder` finds all pairs of atoms within a cutoff distance of one
/// another.
pub trait NeighborFinder {
    /// Get the `n x n` adjacency matrix of the atoms at `coordinates` (with
    /// shape `(n, 3)`), where `adjacency[[i, j]]` is `true` if the distance
    /// between atoms `i` and `j` is lower or equal to `cutoff`. The matrix
    /// must be symmetric. The value of the diagonal is ignored.
    ///
    /// Implementations should return an error for non-positive cutoffs or
    /// non-finite coordinates instead of panicking.
    fn adjacency_matrix(&self, coordinates: ArrayView2<'_, f64>, cutoff: f64) -> Result<Array2<bool>, Error>;
}

/// Pair produced by the cell list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPair {
    /// index of the first atom in the pair
    pub first: usize,
    /// index of the second atom in the pair
    pub second: usize,
}

/// The cell list is used to sort atoms inside bins/cells.
///
/// The cells cover the bounding box of the atoms, without periodic boundary
/// conditions. The list of potential pairs is then constructed by looking
/// through all neighboring cells (the number of cells to search depends on the
/// cutoff and the size of the cells) for each atom to create pair candidates.
#[derive(Debug, Clone)]
pub struct CellList {
    /// How many cells do we need to look at when searching neighbors to include
    /// all neighbors below cutoff
    n_search: [i32; 3],
    /// the cells themselves, containing the indexes of the atoms
    cells: Array3<Vec<usize>>,
    /// lower corner of the bounding box
    origin: Vector3D,
    /// size of the bounding box in each direction
    extent: Vector3D,
}

impl CellList {
    /// Create a new `CellList` covering the box between `lower` and `upper`,
    /// for the given cutoff.
    pub fn new(lower: Vector3D, upper: Vector3D, cutoff: f64) -> Result<CellList, Error> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cell list cutoff must be a positive finite number, got {}", cutoff
            )));
        }
        let extent = upper - lower;

        let mut n_cells = [
            f64::clamp(f64::trunc(extent[0] / cutoff), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(extent[1] / cutoff), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(extent[2] / cutoff), 1.0, f64::INFINITY),
        ];

        if !(n_cells[0].is_finite() && n_cells[1].is_finite() && n_cells[2].is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cell list bounding box must be finite, got {:?} to {:?}", lower, upper
            )));
        }

        // limit memory consumption by ensuring we have less than `MAX_N_CELLS`
        // cells to look though
        let n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        if n_cells_total > MAX_NUMBER_OF_CELLS {
            // set the total number of cells close to MAX_N_CELLS, while keeping
            // roughly the ratio of cells in each direction
            let ratio_x_y = n_cells[0] / n_cells[1];
            let ratio_y_z = n_cells[1] / n_cells[2];

            n_cells[2] = f64::max(f64::trunc(f64::cbrt(MAX_NUMBER_OF_CELLS / (ratio_x_y * ratio_y_z * ratio_y_z))), 1.0);
            n_cells[1] = f64::max(f64::trunc(ratio_y_z * n_cells[2]), 1.0);
            n_cells[0] = f64::max(f64::trunc(ratio_x_y * n_cells[1]), 1.0);
        }

        let mut n_search = [0; 3];
        for xyz in 0..3 {
            // don't look for neighboring cells if we have only one cell in
            // this direction
            if n_cells[xyz] > 1.0 {
                // number of cells to search to make sure all possible pairs
                // below the cutoff are accounted for.
                n_search[xyz] = i32::max(f64::ceil(cutoff * n_cells[xyz] / extent[xyz]) as i32, 1);
            }
        }

        let n_cells = [
            n_cells[0] as usize,
            n_cells[1] as usize,
            n_cells[2] as usize,
        ];

        Ok(CellList {
            n_search: n_search,
            cells: Array3::from_elem(n_cells, Vec::new()),
            origin: lower,
            extent: extent,
        })
    }

    /// Add a single atom to the cell list at the given `position`. The atom is
    /// uniquely identified by its `index`.
    pub fn add_atom(&mut self, index: usize, position: Vector3D) {
        let n_cells = self.cells.shape();
        let n_cells = [n_cells[0], n_cells[1], n_cells[2]];

        // find the subcell in which this atom 'should go'
        let mut cell_index = [0; 3];
        for xyz in 0..3 {
            if self.extent[xyz] > 0.0 {
                let fractional = (position[xyz] - self.origin[xyz]) / self.extent[xyz];
                let i = f64::floor(fractional * n_cells[xyz] as f64);
                // atoms on the upper boundary (or outside of the box) go in
                // the last cell
                cell_index[xyz] = f64::clamp(i, 0.0, (n_cells[xyz] - 1) as f64) as usize;
            }
        }

        self.cells[cell_index].push(index);
    }

    /// Get the list of candidate pair. Some pairs might be separated by more
    /// than `cutoff`, so additional filtering of the pairs might be required
    /// later.
    ///
    /// This function produces a so-called "half" neighbors list, where each
    /// pair is only included once. For example, if atoms 33 and 64 are in range
    /// of each other, the output will only contain pairs in the order 33-64,
    /// and not 64-33. Pairs between an atom and itself are never included.
    pub fn pairs(&self) -> Vec<CellPair> {
        let mut pairs = Vec::new();

        let n_cells = self.cells.shape();
        let n_cells = [n_cells[0] as i32, n_cells[1] as i32, n_cells[2] as i32];

        let search_x = -self.n_search[0]..=self.n_search[0];
        let search_y = -self.n_search[1]..=self.n_search[1];
        let search_z = -self.n_search[2]..=self.n_search[2];

        // for each cell in the cell list
        for ((cell_i_x, cell_i_y, cell_i_z), current_cell) in self.cells.indexed_iter() {
            // look through each neighboring cell
            for delta_x in search_x.clone() {
                for delta_y in search_y.clone() {
                    for delta_z in search_z.clone() {
                        let cell_i = [
                            cell_i_x as i32 + delta_x,
                            cell_i_y as i32 + delta_y,
                            cell_i_z as i32 + delta_z,
                        ];

                        // there is nothing outside of the bounding box
                        if (0..3).any(|xyz| cell_i[xyz] < 0 || cell_i[xyz] >= n_cells[xyz]) {
                            continue;
                        }

                        let neighbor_cell_i = [
                            cell_i[0] as usize,
                            cell_i[1] as usize,
                            cell_i[2] as usize,
                        ];

                        for &atom_i in current_cell {
                            for &atom_j in &self.cells[neighbor_cell_i] {
                                // create a half neighbor list
                                if atom_i >= atom_j {
                                    continue;
                                }

                                pairs.push(CellPair {
                                    first: atom_i,
                                    second: atom_j,
                                });
                            }
                        } // loop over atoms in current neighbor cells

                    }
                }
            } // loop over neighboring cells

        }

        return pairs;
    }
}

/// A neighbor list implementation usable with any set of positions
#[derive(Clone, Debug)]
pub struct NeighborsList {
    /// the cutoff used to create this neighbor list
    pub cutoff: f64,
    /// all pairs in the system
    pub pairs: Vec<Pair>,
}

impl NeighborsList {
    #[time_graph::instrument(name = "NeighborsList")]
    pub fn new(positions: &[Vector3D], cutoff: f64) -> Result<NeighborsList, Error> {
        if positions.is_empty() {
            return Ok(NeighborsList {
                cutoff: cutoff,
                pairs: Vec::new(),
            });
        }

        if let Some(index) = positions.iter().position(|p| !(p[0].is_finite() && p[1].is_finite() && p[2].is_finite())) {
            return Err(Error::InvalidParameter(format!(
                "position of atom {} is not finite: {:?}", index, positions[index]
            )));
        }

        let mut lower = positions[0];
        let mut upper = positions[0];
        for position in positions {
            for xyz in 0..3 {
                lower[xyz] = f64::min(lower[xyz], position[xyz]);
                upper[xyz] = f64::max(upper[xyz], position[xyz]);
            }
        }

        let mut cell_list = CellList::new(lower, upper, cutoff)?;
        for (index, &position) in positions.iter().enumerate() {
            cell_list.add_atom(index, position);
        }

        let cutoff2 = cutoff * cutoff;

        // the cell list creates too many pairs, we only need to keep the one where
        // the distance is actually below the cutoff
        let mut pairs = Vec::new();
        for pair in cell_list.pairs() {
            let vector = positions[pair.second] - positions[pair.first];

            let distance2 = vector * vector;
            if distance2 <= cutoff2 {
                if distance2 < 1e-3 {
                    warn!(
                        "atoms {} and {} are very close to one another ({} A)",
                        pair.first, pair.second, distance2.sqrt()
                    );
                }

                pairs.push(Pair {
                    first: pair.first,
                    second: pair.second,
                    distance: distance2.sqrt(),
                    vector: vector,
                });
            }
        }

        pairs.sort_unstable_by_key(|pair| (pair.first, pair.second));

        return Ok(NeighborsList {
            cutoff: cutoff,
            pairs: pairs,
        });
    }
}

/// [`NeighborFinder`] using a [`CellList`], avoiding the computation of all
/// pairwise distances for large systems.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellListFinder;

impl NeighborFinder for CellListFinder {
    fn adjacency_matrix(&self, coordinates: ArrayView2<'_, f64>, cutoff: f64) -> Result<Array2<bool>, Error> {
        let positions = coordinates.rows().into_iter()
            .map(|row| Vector3D::new(row[0], row[1], row[2]))
            .collect::<Vec<_>>();

        let n_atoms = positions.len();
        let mut adjacency = Array2::from_elem((n_atoms, n_atoms), false);
        for pair in NeighborsList::new(&positions, cutoff)?.pairs {
            adjacency[[pair.first, pair.second]] = true;
            adjacency[[pair.second, pair.first]] = true;
        }

        return Ok(adjacency);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use ndarray::Array2;

    use super::*;

    #[test]
    fn non_periodic() {
        let positions = [
            Vector3D::new(0.134, 1.282, 1.701),
            Vector3D::new(-0.273, 1.026, -1.471),
            Vector3D::new(1.922, -0.124, 1.900),
            Vector3D::new(1.400, -0.464, 0.480),
            Vector3D::new(0.149, 1.865, 0.635),
        ];

        let neighbors = NeighborsList::new(&positions, 3.42).unwrap();

        // reference computed with ASE
        let reference = [
            (0, 1, 3.2082345612501593),
            (0, 2, 2.283282943482914),
            (0, 3, 2.4783286706972505),
            (0, 4, 1.215100818862369),
            (1, 3, 2.9707625283755013),
            (1, 4, 2.3059143522689647),
            (2, 3, 1.550639867925496),
            (2, 4, 2.9495550511899244),
            (3, 4, 2.6482573515427084),
        ];

        assert_eq!(neighbors.pairs.len(), reference.len());
        for (pair, reference) in neighbors.pairs.iter().zip(&reference) {
            assert_eq!(pair.first, reference.0);
            assert_eq!(pair.second, reference.1);
            assert_ulps_eq!(pair.distance, reference.2);
        }
    }

    #[test]
    fn many_cells() {
        // atoms on a line, only direct neighbors are within the cutoff
        let positions = (0..20)
            .map(|i| Vector3D::new(1.5 * i as f64, 0.0, 0.0))
            .collect::<Vec<_>>();

        let neighbors = NeighborsList::new(&positions, 2.0).unwrap();
        assert_eq!(neighbors.pairs.len(), 19);
        for (i, pair) in neighbors.pairs.iter().enumerate() {
            assert_eq!(pair.first, i);
            assert_eq!(pair.second, i + 1);
            assert_ulps_eq!(pair.distance, 1.5);
            assert_ulps_eq!(pair.vector, Vector3D::new(1.5, 0.0, 0.0));
        }
    }

    #[test]
    fn cutoff_is_inclusive() {
        let positions = [
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.0, 0.0, 2.0),
            Vector3D::new(0.0, 0.0, 4.5),
        ];

        let neighbors = NeighborsList::new(&positions, 2.0).unwrap();
        assert_eq!(neighbors.pairs.len(), 1);
        assert_eq!((neighbors.pairs[0].first, neighbors.pairs[0].second), (0, 1));
    }

    #[test]
    fn empty() {
        let neighbors = NeighborsList::new(&[], 3.0).unwrap();
        assert!(neighbors.pairs.is_empty());

        let adjacency = CellListFinder.adjacency_matrix(Array2::<f64>::zeros((0, 3)).view(), 3.0).unwrap();
        assert_eq!(adjacency.shape(), [0, 0]);
    }

    #[test]
    fn adjacency_matrix_is_symmetric() {
        let coordinates = ndarray::array![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [5.0, 0.0, 0.0],
            [5.0, 0.9, 0.0],
        ];

        let adjacency = CellListFinder.adjacency_matrix(coordinates.view(), 1.2).unwrap();
        let expected = ndarray::array![
            [false, true, false, false],
            [true, false, false, false],
            [false, false, false, true],
            [false, false, true, false],
        ];
        assert_eq!(adjacency, expected);
    }

    #[test]
    fn invalid_cutoff() {
        let positions = [Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)];
        for &cutoff in &[0.0, -2.0, f64::NAN, f64::INFINITY] {
            let error = NeighborsList::new(&positions, cutoff).unwrap_err();
            assert!(matches!(error, Error::InvalidParameter(_)));
        }

        let error = CellListFinder.adjacency_matrix(Array2::<f64>::zeros((3, 3)).view(), 0.0).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: cell list cutoff must be a positive finite number, got 0");
    }

    #[test]
    fn non_finite_positions() {
        let positions = [Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(f64::NAN, 0.0, 0.0)];
        let error = NeighborsList::new(&positions, 2.0).unwrap_err();
        assert!(error.to_string().starts_with("invalid parameter: position of atom 1 is not finite"));
    }
}

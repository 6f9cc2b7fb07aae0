use approx::assert_relative_eq;
use ndarray::{s, Array2, ArrayView2};

use springnet::interaction::{compute_hessian_with_finder, contacts};
use springnet::systems::{CellListFinder, NeighborFinder};
use springnet::{compute_hessian, compute_kirchhoff, ContactOverrides, Error};

mod data;
use data::{InverseSquareForceField, UniformForceField};

#[test]
fn cell_list_matches_brute_force() {
    let coordinates = data::coordinates(&data::globule(150));
    let overrides = ContactOverrides::default();

    for &cutoff in &[4.0, 7.5, 13.0] {
        let force_field = UniformForceField { cutoff: Some(cutoff), constant: 1.0 };

        let brute_force = contacts(coordinates.view(), &force_field, None, &overrides).unwrap();
        let cell_list = contacts(coordinates.view(), &force_field, Some(&CellListFinder), &overrides).unwrap();

        assert!(!brute_force.is_empty());
        assert_eq!(brute_force.pairs, cell_list.pairs);
        for (a, b) in brute_force.sq_distances.iter().zip(&cell_list.sq_distances) {
            assert_relative_eq!(a, b);
        }

        let (with_cell_list, _) = compute_hessian(coordinates.view(), &force_field, true, &overrides).unwrap();
        let (without_cell_list, _) = compute_hessian(coordinates.view(), &force_field, false, &overrides).unwrap();
        assert_relative_eq!(with_cell_list, without_cell_list, epsilon = 1e-12);
    }
}

#[test]
fn distance_dependent_force_field() {
    let coordinates = data::coordinates(&data::helix(8));
    let n_atoms = coordinates.nrows();

    let (kirchhoff, contacts) = compute_kirchhoff(
        coordinates.view(), &InverseSquareForceField, true, &ContactOverrides::default()
    ).unwrap();

    // no cutoff: all pairs interact
    assert_eq!(contacts.len(), n_atoms * (n_atoms - 1));

    for (&[i, j], &sq_distance) in contacts.pairs.iter().zip(&contacts.sq_distances) {
        assert_relative_eq!(kirchhoff[[i, j]], -1.0 / sq_distance);
    }

    for row in kirchhoff.rows() {
        assert_relative_eq!(row.sum(), 0.0, epsilon = 1e-12);
    }

    // the trace of each diagonal block of the Hessian matches the Kirchhoff
    // diagonal, since Tr(d ⊗ d) / r^2 = 1
    let (hessian, _) = compute_hessian(
        coordinates.view(), &InverseSquareForceField, false, &ContactOverrides::default()
    ).unwrap();
    for i in 0..n_atoms {
        let block = hessian.slice(s![3 * i..3 * i + 3, 3 * i..3 * i + 3]);
        assert_relative_eq!(block.diag().sum(), kirchhoff[[i, i]], max_relative = 1e-12);
    }
}

struct NoNeighbors;

impl NeighborFinder for NoNeighbors {
    fn adjacency_matrix(&self, coordinates: ArrayView2<'_, f64>, _: f64) -> Result<Array2<bool>, Error> {
        Ok(Array2::from_elem((coordinates.nrows(), coordinates.nrows()), false))
    }
}

#[test]
fn custom_neighbor_finder() {
    let coordinates = data::coordinates(&data::helix(6));
    let force_field = UniformForceField { cutoff: Some(5.0), constant: 1.0 };

    let overrides = ContactOverrides { off: vec![], on: vec![[0, 5]] };
    let (hessian, contacts) = compute_hessian_with_finder(
        coordinates.view(), &force_field, Some(&NoNeighbors), &overrides
    ).unwrap();

    assert_eq!(contacts.pairs, [[0, 5], [5, 0]]);
    assert_eq!(hessian.shape(), [18, 18]);
    assert_eq!(hessian.slice(s![3..15, ..]), Array2::<f64>::zeros((12, 18)));
}

use ndarray::{Array1, Array2};

/// Quantities cached by an ANM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantity {
    Hessian,
    Covariance,
    MassWeights,
    HessianMw,
    CovarianceMw,
}

impl Quantity {
    /// Get the quantities that can be computed from `self`, and which must
    /// be discarded when `self` is replaced.
    pub fn dependents(self) -> &'static [Quantity] {
        match self {
            Quantity::Hessian => &[Quantity::Covariance, Quantity::HessianMw, Quantity::CovarianceMw],
            Quantity::Covariance => &[Quantity::Hessian, Quantity::HessianMw, Quantity::CovarianceMw],
            Quantity::MassWeights => &[Quantity::HessianMw, Quantity::CovarianceMw],
            Quantity::HessianMw => &[Quantity::MassWeights, Quantity::CovarianceMw],
            Quantity::CovarianceMw => &[Quantity::MassWeights, Quantity::HessianMw],
        }
    }
}

/// Storage for the lazily computed matrices of an ANM. A `None` entry has
/// not been computed yet, or was invalidated.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cache {
    pub hessian: Option<Array2<f64>>,
    pub covariance: Option<Array2<f64>>,
    pub mass_weights: Option<Array1<f64>>,
    pub hessian_mw: Option<Array2<f64>>,
    pub covariance_mw: Option<Array2<f64>>,
}

impl Cache {
    /// Check if the given quantity is currently stored
    pub fn contains(&self, quantity: Quantity) -> bool {
        match quantity {
            Quantity::Hessian => self.hessian.is_some(),
            Quantity::Covariance => self.covariance.is_some(),
            Quantity::MassWeights => self.mass_weights.is_some(),
            Quantity::HessianMw => self.hessian_mw.is_some(),
            Quantity::CovarianceMw => self.covariance_mw.is_some(),
        }
    }

    /// Remove a single quantity from the cache
    fn remove(&mut self, quantity: Quantity) {
        match quantity {
            Quantity::Hessian => self.hessian = None,
            Quantity::Covariance => self.covariance = None,
            Quantity::MassWeights => self.mass_weights = None,
            Quantity::HessianMw => self.hessian_mw = None,
            Quantity::CovarianceMw => self.covariance_mw = None,
        }
    }

    /// Remove all the quantities depending on `quantity` from the cache,
    /// keeping `quantity` itself.
    pub fn invalidate_dependents(&mut self, quantity: Quantity) {
        for &dependent in quantity.dependents() {
            self.remove(dependent);
        }
    }
}

use crate::Error;
use crate::interaction::ContactOverrides;

/// Parameters controlling the construction and analysis of an [`Anm`].
///
/// These can be given as JSON:
///
/// ```
/// # use springnet::AnmParameters;
/// let parameters = AnmParameters::from_json(r#"{
///     "use_cell_list": false,
///     "contact_pair_off": [[0, 1]]
/// }"#).unwrap();
///
/// assert!(!parameters.use_cell_list);
/// assert_eq!(parameters.rcond, 1e-6);
/// assert_eq!(parameters.overrides().off, [[0, 1]]);
/// ```
///
/// [`Anm`]: crate::Anm
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnmParameters {
    /// Use a cell list to find atoms within the cutoff distance of the force
    /// field, instead of checking all pairwise distances. This is faster for
    /// large systems, and ignored if the force field has no cutoff.
    #[serde(default = "serde_default_use_cell_list")]
    pub use_cell_list: bool,
    /// Eigenvalues smaller than `rcond` times the largest eigenvalue (in
    /// absolute value) are considered to be zero when computing a
    /// pseudo-inverse.
    #[serde(default = "serde_default_rcond")]
    pub rcond: f64,
    /// Pairs of atoms that never interact, even if they are within the
    /// cutoff distance
    #[serde(default)]
    pub contact_pair_off: Vec<[usize; 2]>,
    /// Pairs of atoms that always interact, even if they are further apart
    /// than the cutoff distance
    #[serde(default)]
    pub contact_pair_on: Vec<[usize; 2]>,
}

fn serde_default_use_cell_list() -> bool {
    return true;
}

fn serde_default_rcond() -> f64 {
    return 1e-6;
}

impl Default for AnmParameters {
    fn default() -> AnmParameters {
        AnmParameters {
            use_cell_list: serde_default_use_cell_list(),
            rcond: serde_default_rcond(),
            contact_pair_off: Vec::new(),
            contact_pair_on: Vec::new(),
        }
    }
}

impl AnmParameters {
    /// Parse and validate parameters from a JSON string
    pub fn from_json(json: &str) -> Result<AnmParameters, Error> {
        let parameters = serde_json::from_str::<AnmParameters>(json)?;
        parameters.validate()?;
        return Ok(parameters);
    }

    /// Get the JSON schema describing the JSON representation of these
    /// parameters
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnmParameters)
    }

    /// Check that these parameters are valid
    pub fn validate(&self) -> Result<(), Error> {
        if !self.rcond.is_finite() || self.rcond < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected a positive finite value for rcond, got {}", self.rcond
            )));
        }
        return Ok(());
    }

    /// Get the manual contact overrides defined by these parameters
    pub fn overrides(&self) -> ContactOverrides {
        ContactOverrides {
            off: self.contact_pair_off.clone(),
            on: self.contact_pair_on.clone(),
        }
    }
}

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

/// A `ResidueMasses` gives the mass associated with a residue name, used to
/// mass-weight the nodes of the network.
pub trait ResidueMasses {
    /// Get the mass (in Dalton) of the residue with the given name, or `None`
    /// if this residue is unknown.
    fn mass(&self, residue: &str) -> Option<f64>;
}

/// Average masses of the 20 standard amino acids, as they appear inside a
/// peptide chain (i.e. without the water molecule lost in the peptide bond).
static STANDARD_RESIDUE_MASSES: Lazy<BTreeMap<&'static str, f64>> = Lazy::new(|| {
    BTreeMap::from([
        ("ALA", 71.0788),
        ("ARG", 156.1875),
        ("ASN", 114.1038),
        ("ASP", 115.0886),
        ("CYS", 103.1388),
        ("GLN", 128.1307),
        ("GLU", 129.1155),
        ("GLY", 57.0519),
        ("HIS", 137.1411),
        ("ILE", 113.1594),
        ("LEU", 113.1594),
        ("LYS", 128.1741),
        ("MET", 131.1926),
        ("PHE", 147.1766),
        ("PRO", 97.1167),
        ("SER", 87.0782),
        ("THR", 101.1051),
        ("TRP", 186.2132),
        ("TYR", 163.1760),
        ("VAL", 99.1326),
    ])
});

/// Masses of the standard amino acids residues. Residue names are the
/// three-letter codes, and are matched case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResidueMasses;

impl ResidueMasses for StandardResidueMasses {
    fn mass(&self, residue: &str) -> Option<f64> {
        let residue = residue.trim().to_ascii_uppercase();
        STANDARD_RESIDUE_MASSES.get(residue.as_str()).copied()
    }
}

/// Custom residue masses, indexed by residue name
impl ResidueMasses for BTreeMap<String, f64> {
    fn mass(&self, residue: &str) -> Option<f64> {
        self.get(residue).copied()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;

    use super::*;

    #[test]
    fn standard_masses() {
        let masses = StandardResidueMasses;
        assert_ulps_eq!(masses.mass("GLY").unwrap(), 57.0519);
        assert_ulps_eq!(masses.mass("trp").unwrap(), 186.2132);
        assert_ulps_eq!(masses.mass(" ALA").unwrap(), 71.0788);
        assert_eq!(masses.mass("HOH"), None);

        // all residues are heavier than glycine
        for &mass in STANDARD_RESIDUE_MASSES.values() {
            assert!(mass >= 57.0519);
        }
    }

    #[test]
    fn custom_masses() {
        let mut masses = BTreeMap::new();
        masses.insert("LIG".to_string(), 250.0);

        assert_eq!(masses.mass("LIG"), Some(250.0));
        assert_eq!(masses.mass("ALA"), None);
    }
}

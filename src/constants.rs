//! Rest-frame wavelengths of the absorption transitions recognized by the
//! configuration layer.

/// Rest-frame wavelength of the Lyman-alpha transition, in Angstrom.
pub const LYA_WAVELENGTH: f64 = 1215.67;

/// Named absorption transitions and their rest-frame wavelengths [Angstrom].
///
/// The name picks the rest-frame anchor that converts an observed wavelength
/// into an absorber redshift (used by the redshift-evolution reweighting).
pub const ABSORBER_IGM: &[(&str, f64)] = &[
    ("LYA", LYA_WAVELENGTH),
    ("LYB", 1025.72),
    ("SiII(1190)", 1190.4158),
    ("SiII(1193)", 1193.2897),
    ("SiIII(1207)", 1206.50),
    ("SiII(1260)", 1260.4221),
    ("CIV(1548)", 1548.2049),
    ("CIV(1550)", 1550.77845),
    ("MgII(2796)", 2796.3511),
    ("MgII(2803)", 2803.5324),
];

/// Look up the rest-frame wavelength of a named transition.
pub fn absorber_wavelength(name: &str) -> Option<f64> {
    ABSORBER_IGM
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, wavelength)| wavelength)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(absorber_wavelength("LYA"), Some(LYA_WAVELENGTH));
        assert_eq!(absorber_wavelength("LYB"), Some(1025.72));
        assert_eq!(absorber_wavelength("H-alpha"), None);
    }
}

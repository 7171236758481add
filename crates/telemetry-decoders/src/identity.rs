//! Vehicle name normalization.

/// Case-insensitive keywords mapped to canonical vehicle names, first match wins.
const VEHICLE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["FA-18C", "F/A-18C", "HORNET"], "FA18C"),
    (&["F-16C", "VIPER"], "F16C"),
    (&["A-10C", "WARTHOG"], "A10C"),
    (&["F-15E", "STRIKE EAGLE"], "F15E"),
    (&["AH-64D", "APACHE"], "AH64D"),
];

/// Map a raw simulator vehicle identifier to its canonical name.
///
/// Unknown identifiers are returned unchanged.
///
/// ```
/// use cockpit_telemetry_decoders::normalize_vehicle_name;
///
/// assert_eq!(normalize_vehicle_name("FA-18C_hornet"), "FA18C");
/// assert_eq!(normalize_vehicle_name("Su-25T"), "Su-25T");
/// ```
pub fn normalize_vehicle_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    VEHICLE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| upper.contains(keyword)))
        .map_or_else(|| raw.to_string(), |(_, canonical)| (*canonical).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_modules() {
        let cases = [
            ("FA-18C_hornet", "FA18C"),
            ("f/a-18c lot 20", "FA18C"),
            ("F-16C_50", "F16C"),
            ("viper", "F16C"),
            ("A-10C_2", "A10C"),
            ("F-15ESE", "F15E"),
            ("Strike Eagle", "F15E"),
            ("AH-64D_BLK_II", "AH64D"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_vehicle_name(raw), expected, "{raw}");
        }
    }

    #[test]
    fn unknown_passthrough_keeps_case() {
        assert_eq!(normalize_vehicle_name("MiG-29A"), "MiG-29A");
        assert_eq!(normalize_vehicle_name(""), "");
    }
}

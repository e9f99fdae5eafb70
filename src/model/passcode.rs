//! Voter passcode derivation.
//!
//! Passcodes are deterministic so the roster can be regenerated and
//! redistributed at any time without storing anything secret.

/// Derive a voter's passcode from their LRN and name: the last five
/// characters of the LRN followed by the uppercased initials of the first
/// and last name.
///
/// An LRN shorter than five characters yields an empty passcode; rosters
/// with such LRNs are rejected at creation and import.
pub fn derive(lrn: &str, first_name: &str, last_name: &str) -> String {
    let len = lrn.chars().count();
    if len < 5 {
        return String::new();
    }
    let mut passcode: String = lrn.chars().skip(len - 5).collect();
    for name in [first_name, last_name] {
        if let Some(initial) = name.chars().next() {
            passcode.extend(initial.to_uppercase());
        }
    }
    passcode
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_length_lrn() {
        assert_eq!(derive("109845090001", "Juana", "Dela Cruz"), "90001JD");
    }

    #[test]
    fn exactly_five_characters() {
        assert_eq!(derive("12345", "Ana", "Reyes"), "12345AR");
    }

    #[test]
    fn short_lrn_yields_empty_passcode() {
        assert_eq!(derive("1234", "Ana", "Reyes"), "");
        assert_eq!(derive("", "Ana", "Reyes"), "");
    }

    #[test]
    fn initials_are_uppercased() {
        assert_eq!(derive("109845090002", "maria", "santos"), "90002MS");
    }

    #[test]
    fn empty_names_contribute_nothing() {
        assert_eq!(derive("109845090003", "", ""), "90003");
        assert_eq!(derive("109845090003", "Jose", ""), "90003J");
    }
}

//! Case folding for medicine names.
//!
//! ## Summary
//! Medicine names are matched case-insensitively and exactly. Both stored
//! names and query terms go through [`fold_medicine_name`], after which a match
//! is plain string equality. Folding uses ICU full case folding so that
//! `"STRASSE"` and `"Straße"` compare equal, the same way the rest of the
//! stack treats Unicode text.

use std::collections::BTreeSet;

use icu::casemap::CaseMapper;

/// Fold a medicine name for comparison.
///
/// Trims surrounding whitespace and applies Unicode case folding.
///
/// Examples:
/// - "Paracetamol" -> "paracetamol"
/// - "  IBUPROFEN " -> "ibuprofen"
#[must_use]
pub fn fold_medicine_name(name: &str) -> String {
    CaseMapper::new().fold_string(name.trim()).into_owned()
}

/// Split a comma-separated list of medicine names into a folded match set.
///
/// Empty segments (after trimming) are dropped, so `""` and `" , "` both yield
/// an empty set.
#[must_use]
pub fn fold_medicine_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(fold_medicine_name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(fold_medicine_name("paracetamol"), "paracetamol");
    }

    #[test]
    fn test_mixed_case() {
        assert_eq!(fold_medicine_name("AmOxiCillin"), "amoxicillin");
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(fold_medicine_name("  Cetirizine\t"), "cetirizine");
    }

    #[test]
    fn test_inner_whitespace_is_kept() {
        assert_eq!(fold_medicine_name("Vitamin  C"), "vitamin  c");
    }

    #[test]
    fn test_unicode_folding() {
        assert_eq!(fold_medicine_name("Straße"), fold_medicine_name("STRASSE"));
    }

    #[test]
    fn test_list_split_and_trim() {
        let set = fold_medicine_list("Paracetamol, Ibuprofen ,paracetamol");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["ibuprofen".to_string(), "paracetamol".to_string()]
        );
    }

    #[test]
    fn test_empty_list() {
        assert!(fold_medicine_list("").is_empty());
        assert!(fold_medicine_list(" , ,").is_empty());
    }
}

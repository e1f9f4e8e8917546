//! Font family keys
//!
//! Stylesheets refer to a font family by a key derived from its display name:
//! lowercase, spaces replaced by `_` (`"Roboto Mono"` -> `roboto_mono`).

use std::collections::BTreeMap;

pub fn font_key(family: &str) -> String {
    family.to_lowercase().replace(' ', "_")
}

/// Map each family's key to its display name. Later duplicates of a key win.
pub fn font_families<S: AsRef<str>>(fonts: &[S]) -> BTreeMap<String, String> {
    fonts
        .iter()
        .map(|family| {
            let family = family.as_ref();
            (font_key(family), family.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_key() {
        assert_eq!(font_key("Roboto Mono"), "roboto_mono");
        assert_eq!(font_key("Inter"), "inter");
        assert_eq!(font_key(""), "");
    }

    #[test]
    fn test_font_families() {
        let map = font_families(&["Inter", "Roboto Mono", "Noto Sans JP"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map["roboto_mono"], "Roboto Mono");
        assert_eq!(map["noto_sans_jp"], "Noto Sans JP");
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["inter", "noto_sans_jp", "roboto_mono"]
        );
    }
}

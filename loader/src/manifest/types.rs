//! Manifest Types
//!
//! The manifest resource is key/value text naming a module's bootstrap type.

use std::collections::BTreeMap;

/// Resource name of a module manifest
pub const MANIFEST_NAME: &str = "pfunc.properties";

/// Key naming the bootstrap type
pub const BOOTSTRAP_KEY: &str = "bootstrap";

/// Bootstrap type used when the manifest does not name one
pub const DEFAULT_BOOTSTRAP_TYPE: &str = "pfunc_bootstrap";

/// Parsed manifest resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    properties: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse `key=value` / `key: value` lines; `#` and `!` start comments.
    ///
    /// Parsing never fails: a line without a separator is a key with an
    /// empty value, and later duplicates replace earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut properties = BTreeMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = match line.find(['=', ':']) {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            properties.insert(key.to_string(), value.trim().to_string());
        }

        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The bootstrap type this manifest names, or the default.
    pub fn bootstrap_type(&self) -> &str {
        match self.get(BOOTSTRAP_KEY) {
            Some(value) if !value.is_empty() => value,
            _ => DEFAULT_BOOTSTRAP_TYPE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bootstrap_key() {
        let manifest = Manifest::parse("# module manifest\nbootstrap = my_module_entry\nversion: 2\n");
        assert_eq!(manifest.bootstrap_type(), "my_module_entry");
        assert_eq!(manifest.get("version"), Some("2"));
    }

    #[test]
    fn test_empty_manifest_uses_default() {
        let manifest = Manifest::parse("");
        assert!(manifest.is_empty());
        assert_eq!(manifest.bootstrap_type(), DEFAULT_BOOTSTRAP_TYPE);
    }

    #[test]
    fn test_missing_or_blank_key_uses_default() {
        assert_eq!(Manifest::parse("other=1").bootstrap_type(), DEFAULT_BOOTSTRAP_TYPE);
        assert_eq!(Manifest::parse("bootstrap=").bootstrap_type(), DEFAULT_BOOTSTRAP_TYPE);
        assert_eq!(Manifest::parse("! comment\nflag").get("flag"), Some(""));
    }
}

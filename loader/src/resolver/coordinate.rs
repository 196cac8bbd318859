//! Artifact Coordinates
//!
//! `group:artifact:version[:classifier]` and its repository layout.

use std::fmt;
use std::str::FromStr;

use super::ResolveError;

/// A parsed artifact coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
}

/// Mediation key: versions of the same key compete
pub type ArtifactKey = (String, String, Option<String>);

impl ArtifactCoordinate {
    pub fn key(&self) -> ArtifactKey {
        (self.group.clone(), self.artifact.clone(), self.classifier.clone())
    }

    /// Repository directory holding this version, relative to the repository root.
    pub fn directory(&self) -> String {
        format!("{}/{}/{}", self.group.replace('.', "/"), self.artifact, self.version)
    }

    /// Relative path of the loadable module.
    pub fn artifact_path(&self) -> String {
        let classifier = match &self.classifier {
            Some(classifier) => format!("-{}", classifier),
            None => String::new(),
        };
        format!(
            "{}/{}-{}{}.{}",
            self.directory(),
            self.artifact,
            self.version,
            classifier,
            std::env::consts::DLL_EXTENSION
        )
    }

    /// Relative path of the module descriptor listing dependencies.
    pub fn descriptor_path(&self) -> String {
        format!("{}/{}-{}.json", self.directory(), self.artifact, self.version)
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ResolveError::InvalidCoordinate(s.to_string(), reason.to_string());

        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != 3 && fields.len() != 4 {
            return Err(invalid("expected group:artifact:version[:classifier]"));
        }
        for field in &fields {
            if field.is_empty() {
                return Err(invalid("empty field"));
            }
            if field.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') || field.contains("..") {
                return Err(invalid("illegal character in field"));
            }
            if *field == "." {
                return Err(invalid("field cannot be '.'"));
            }
        }
        // Each group segment becomes a directory under the repository root.
        if fields[0].split('.').any(str::is_empty) {
            return Err(invalid("empty group segment"));
        }

        Ok(Self {
            group: fields[0].to_string(),
            artifact: fields[1].to_string(),
            version: fields[2].to_string(),
            classifier: fields.get(3).map(|c| c.to_string()),
        })
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let c: ArtifactCoordinate = "io.pfunc:pfunc-sample:1.0".parse().unwrap();
        assert_eq!(c.group, "io.pfunc");
        assert_eq!(c.artifact, "pfunc-sample");
        assert_eq!(c.version, "1.0");
        assert_eq!(c.classifier, None);
        assert_eq!(c.to_string(), "io.pfunc:pfunc-sample:1.0");

        let c: ArtifactCoordinate = "g:a:1.0:linux".parse().unwrap();
        assert_eq!(c.classifier.as_deref(), Some("linux"));
        assert_eq!(c.to_string(), "g:a:1.0:linux");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "not-a-coordinate",
            "g:a",
            "g:a:1:c:x",
            "g::1.0",
            "g:a:1.0 ",
            "g/x:a:1",
            "g:a:..",
            "g:a\\b:1",
            ".tmp:evil:1.0",
            ".:a:1.0",
            "g.:a:1.0",
            "g..h:a:1.0",
            "g:.:1.0",
            "g:a:.",
            "g:a:1.0:.",
        ] {
            assert!(
                matches!(bad.parse::<ArtifactCoordinate>(), Err(ResolveError::InvalidCoordinate(..))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_paths_stay_under_repository_root() {
        let root = std::path::Path::new("/home/user/.pfunc/repository");
        for ok in ["io.pfunc:sample:1.0", "g:.hidden:1.0-rc", "a.b.c:x:1:linux"] {
            let c: ArtifactCoordinate = ok.parse().unwrap();
            for relative in [c.artifact_path(), c.descriptor_path()] {
                assert!(!relative.starts_with('/'), "{} is absolute", relative);
                assert!(root.join(&relative).starts_with(root));
            }
        }
    }

    #[test]
    fn test_layout() {
        let c: ArtifactCoordinate = "io.pfunc:sample:1.0:x86".parse().unwrap();
        let ext = std::env::consts::DLL_EXTENSION;
        assert_eq!(c.directory(), "io/pfunc/sample/1.0");
        assert_eq!(c.artifact_path(), format!("io/pfunc/sample/1.0/sample-1.0-x86.{}", ext));
        assert_eq!(c.descriptor_path(), "io/pfunc/sample/1.0/sample-1.0.json");
    }
}

//! # Axiom Documents
//!
//! Loading of the serialized inputs of the binary: an axiom document (JSON
//! or TOML, chosen by file extension), an optional reasoner configuration
//! (TOML), and concept arguments given on the command line.
//!
//! ## Document shape
//!
//! ```toml
//! [config]
//! unique_name_assumption = true
//!
//! [[axioms]]
//! axiom = "sub_class_of"
//! sub = { atom = "Parent" }
//! sup = { exists = ["hasChild", "top"] }
//!
//! [[axioms]]
//! axiom = "class_assertion"
//! individual = "ann"
//! class = { atom = "Parent" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tabula_core::{Axiom, Concept, ReasonerConfig, ReasonerError};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of an axiom document (64 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum size of a configuration file (1 MB).
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

fn read_limited(path: &Path, max_size: u64) -> Result<String, ReasonerError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        ReasonerError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(ReasonerError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > max_size {
        return Err(ReasonerError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    std::fs::read_to_string(path)
        .map_err(|e| ReasonerError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ReasonerError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ReasonerError::SerializationError(format!(
                "Unsupported document extension {:?} (expected .json or .toml)",
                other.unwrap_or("")
            ))),
        }
    }
}

/// A knowledge base on disk: axioms plus optional reasoner options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ReasonerConfig>,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
}

impl Document {
    /// Parse a document from text.
    pub fn parse(text: &str, format: Format) -> Result<Self, ReasonerError> {
        match format {
            Format::Json => serde_json::from_str(text)
                .map_err(|e| ReasonerError::SerializationError(format!("Invalid JSON document: {e}"))),
            Format::Toml => toml::from_str(text)
                .map_err(|e| ReasonerError::SerializationError(format!("Invalid TOML document: {e}"))),
        }
    }

    /// Read and parse a document file.
    pub fn load(path: &Path) -> Result<Self, ReasonerError> {
        let format = Format::from_path(path)?;
        let text = read_limited(path, MAX_DOCUMENT_SIZE)?;
        let document = Self::parse(&text, format)?;
        tracing::debug!(
            path = %path.display(),
            axioms = document.axioms.len(),
            "document loaded"
        );
        Ok(document)
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Read reasoner options from a TOML file.
pub fn load_config(path: &Path) -> Result<ReasonerConfig, ReasonerError> {
    let text = read_limited(path, MAX_CONFIG_SIZE)?;
    let config: ReasonerConfig = toml::from_str(&text)
        .map_err(|e| ReasonerError::ConfigError(format!("Invalid config '{}': {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

// =============================================================================
// CONCEPT ARGUMENTS
// =============================================================================

/// Parse a concept given on the command line.
///
/// A bare name is a class; `top`/`owl:Thing` and `bottom`/`owl:Nothing`
/// are the constants. Anything starting with `{` or `"` is read as the
/// JSON form of a concept.
pub fn parse_concept(arg: &str) -> Result<Concept, ReasonerError> {
    let arg = arg.trim();
    if arg.starts_with('{') || arg.starts_with('"') {
        return serde_json::from_str(arg)
            .map_err(|e| ReasonerError::InvalidConcept(format!("{arg}: {e}")));
    }
    match arg {
        "" => Err(ReasonerError::InvalidConcept("empty concept".to_string())),
        "top" | "owl:Thing" | "⊤" => Ok(Concept::Top),
        "bottom" | "owl:Nothing" | "⊥" => Ok(Concept::Bottom),
        name if name.chars().any(char::is_whitespace) => Err(ReasonerError::InvalidConcept(
            format!("'{name}' is not a class name; use the JSON form for complex concepts"),
        )),
        name => Ok(Concept::atom(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{Name, Role};

    #[test]
    fn bare_names_are_classes() {
        assert_eq!(parse_concept("Person").expect("parse"), Concept::atom("Person"));
        assert_eq!(parse_concept("owl:Thing").expect("parse"), Concept::Top);
        assert_eq!(parse_concept("bottom").expect("parse"), Concept::Bottom);
    }

    #[test]
    fn json_concepts_parse() {
        let c = parse_concept(r#"{"exists": ["hasChild", {"atom": "Person"}]}"#).expect("parse");
        assert_eq!(c, Concept::exists("hasChild", Concept::atom("Person")));
        assert_eq!(parse_concept(r#""top""#).expect("parse"), Concept::Top);
    }

    #[test]
    fn malformed_concepts_are_rejected() {
        assert!(matches!(parse_concept(""), Err(ReasonerError::InvalidConcept(_))));
        assert!(matches!(parse_concept("A and B"), Err(ReasonerError::InvalidConcept(_))));
        assert!(matches!(parse_concept("{nope"), Err(ReasonerError::InvalidConcept(_))));
    }

    #[test]
    fn json_document_parses() {
        let text = r#"{
            "axioms": [
                {"axiom": "functional_role", "role": "hasParent"},
                {"axiom": "role_assertion", "subject": "john", "role": "hasParent", "object": "mary"}
            ]
        }"#;
        let document = Document::parse(text, Format::Json).expect("parse");
        assert!(document.config.is_none());
        assert_eq!(
            document.axioms,
            vec![
                Axiom::FunctionalRole { role: Role::new("hasParent") },
                Axiom::RoleAssertion {
                    subject: Name::new("john"),
                    role: Role::new("hasParent"),
                    object: Name::new("mary"),
                },
            ]
        );
    }

    #[test]
    fn toml_document_with_config_parses() {
        let text = r#"
            [config]
            unique_name_assumption = true
            timeout_ms = 500

            [[axioms]]
            axiom = "class_assertion"
            individual = "a"
            class = { atom = "A" }
        "#;
        let document = Document::parse(text, Format::Toml).expect("parse");
        let config = document.config.expect("config");
        assert!(config.unique_name_assumption);
        assert_eq!(config.timeout_ms, Some(500));
        assert!(config.use_cache);
        assert_eq!(document.axioms.len(), 1);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert_eq!(Format::from_path(Path::new("kb.json")).expect("json"), Format::Json);
        assert!(Format::from_path(Path::new("kb.owl")).is_err());
        assert!(Format::from_path(Path::new("kb")).is_err());
    }
}

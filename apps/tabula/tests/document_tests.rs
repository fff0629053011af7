//! Integration tests for document loading and the CLI session.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::Write;
use std::path::PathBuf;
use tabula::cli::{BlockingArg, ConfigOverrides, Session};
use tabula::document::{Document, load_config};
use tabula_core::{BlockingKind, Concept, Name, ReasonerConfig, ReasonerError};
use tempfile::TempDir;

const FAMILY_TOML: &str = r#"
[[axioms]]
axiom = "equivalent_classes"
class = "Parent"
definition = { exists = ["hasChild", "top"] }

[[axioms]]
axiom = "sub_class_of"
sub = { atom = "Mother" }
sup = { atom = "Parent" }

[[axioms]]
axiom = "class_assertion"
individual = "ann"
class = { atom = "Mother" }

[[axioms]]
axiom = "role_assertion"
subject = "bob"
role = "hasChild"
object = "carl"
"#;

const CLASH_JSON: &str = r#"{
  "config": { "unique_name_assumption": true },
  "axioms": [
    { "axiom": "functional_role", "role": "hasParent" },
    { "axiom": "role_assertion", "subject": "john", "role": "hasParent", "object": "mary" },
    { "axiom": "role_assertion", "subject": "john", "role": "hasParent", "object": "ann" }
  ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

// =============================================================================
// DOCUMENT LOADING
// =============================================================================

#[test]
fn test_toml_document_loads() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "family.toml", FAMILY_TOML);

    let document = Document::load(&path).unwrap();
    assert_eq!(document.axioms.len(), 4);
    assert!(document.config.is_none());
}

#[test]
fn test_json_document_round_trips_through_serde() {
    let document = Document::parse(CLASH_JSON, tabula::document::Format::Json).unwrap();
    let json = serde_json::to_string(&document).unwrap();
    let again = Document::parse(&json, tabula::document::Format::Json).unwrap();
    assert_eq!(document, again);
}

#[test]
fn test_missing_document_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = Document::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(ReasonerError::IoError(_))));
}

#[test]
fn test_malformed_document_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.json", r#"{"axioms": [{"axiom": "no_such_axiom"}]}"#);
    assert!(matches!(
        Document::load(&path),
        Err(ReasonerError::SerializationError(_))
    ));
}

#[test]
fn test_directory_is_not_a_document() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("nested.json");
    std::fs::create_dir(&sub).unwrap();
    assert!(matches!(Document::load(&sub), Err(ReasonerError::IoError(_))));
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_config_file_loads_and_validates() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.toml", "use_cache = false\nblocking = \"pairwise\"\n");
    let config = load_config(&good).unwrap();
    assert!(!config.use_cache);
    assert_eq!(config.blocking, Some(BlockingKind::Pairwise));
    assert!(config.semantic_branching);

    let bad = write(&dir, "bad.toml", "timeout_ms = 0\n");
    assert!(matches!(load_config(&bad), Err(ReasonerError::ConfigError(_))));
}

#[test]
fn test_flags_override_file_config() {
    let overrides = ConfigOverrides {
        unique_names: true,
        no_cache: true,
        timeout_ms: Some(250),
        blocking: Some(BlockingArg::Equality),
        ..ConfigOverrides::default()
    };
    let base = ReasonerConfig {
        explain: true,
        ..ReasonerConfig::default()
    };
    let config = overrides.apply(base);
    assert!(config.unique_name_assumption);
    assert!(!config.use_cache);
    assert!(config.explain);
    assert_eq!(config.timeout_ms, Some(250));
    assert_eq!(config.blocking, Some(BlockingKind::Equality));
}

#[test]
fn test_config_file_replaces_document_config() {
    let dir = TempDir::new().unwrap();
    let document = write(&dir, "clash.json", CLASH_JSON);

    let mut from_document = Session::open(&document, None, &ConfigOverrides::default()).unwrap();
    assert!(!from_document.kb.is_consistent().unwrap());

    let config = write(&dir, "open.toml", "unique_name_assumption = false\n");
    let mut from_file =
        Session::open(&document, Some(config.as_path()), &ConfigOverrides::default()).unwrap();
    assert!(from_file.kb.is_consistent().unwrap());
}

// =============================================================================
// SESSION QUERIES
// =============================================================================

#[test]
fn test_session_answers_queries() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "family.toml", FAMILY_TOML);
    let mut session = Session::open(&path, None, &ConfigOverrides::default()).unwrap();

    assert_eq!(session.axiom_count, 4);
    assert!(session.kb.is_consistent().unwrap());
    assert!(
        session
            .kb
            .is_sub_class_of(&Concept::atom("Mother"), &Concept::atom("Parent"))
            .unwrap()
    );
    assert_eq!(
        session.kb.get_instances(&Concept::atom("Parent")).unwrap(),
        vec![Name::new("ann"), Name::new("bob")]
    );
}

#[test]
fn test_session_explains_clash() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "clash.json", CLASH_JSON);
    let overrides = ConfigOverrides {
        explain: true,
        ..ConfigOverrides::default()
    };
    let mut session = Session::open(&path, None, &overrides).unwrap();

    assert!(!session.kb.is_consistent().unwrap());
    let explanation = session.kb.explanation().unwrap();
    assert_eq!(explanation.axioms.len(), 3);
    assert!(explanation.clash.contains("functional"));
}

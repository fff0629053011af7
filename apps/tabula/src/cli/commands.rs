//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ConfigOverrides;
use crate::document::{Document, load_config, parse_concept};
use std::path::{Path, PathBuf};
use tabula_core::{KnowledgeBase, Name, ReasonerConfig, ReasonerError};

// =============================================================================
// SESSION
// =============================================================================

/// A loaded document and the knowledge base built from it.
#[derive(Debug)]
pub struct Session {
    pub path: PathBuf,
    pub axiom_count: usize,
    pub kb: KnowledgeBase,
}

impl Session {
    /// Load `document`, resolve the configuration and compile.
    ///
    /// Configuration precedence: `config_path` if given, else the
    /// document's own `[config]`, else defaults; flags apply last.
    pub fn open(
        document: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ReasonerError> {
        let loaded = Document::load(document)?;
        let file_config = config_path.map(load_config).transpose()?;
        Self::from_document(document, loaded, file_config, overrides)
    }

    /// Compile an already parsed document.
    pub fn from_document(
        path: &Path,
        document: Document,
        config: Option<ReasonerConfig>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ReasonerError> {
        let base = config.or(document.config).unwrap_or_default();
        let config = overrides.apply(base);
        let kb = KnowledgeBase::new(&document.axioms, config)?;
        Ok(Self {
            path: path.to_path_buf(),
            axiom_count: document.axioms.len(),
            kb,
        })
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn yes_no(answer: bool) -> &'static str {
    if answer { "yes" } else { "no" }
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Show axiom counts, expressivity and the effective configuration.
pub fn cmd_info(session: &Session, json_mode: bool) -> Result<(), ReasonerError> {
    let ontology = session.kb.ontology();
    let expressivity = ontology.expressivity();

    if json_mode {
        let output = serde_json::json!({
            "document": session.path.to_string_lossy(),
            "axioms": session.axiom_count,
            "individuals": ontology.individuals().len(),
            "rules": ontology.rules().len(),
            "dl": expressivity.dl_name(),
            "blocking": expressivity.blocking(),
            "expressivity": expressivity,
            "config": ontology.config(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("Tabula Knowledge Base");
    println!("=====================");
    println!("Document:    {:?}", session.path);
    println!();
    println!("Axioms:      {}", session.axiom_count);
    println!("Individuals: {}", ontology.individuals().len());
    println!("Rules:       {}", ontology.rules().len());
    println!("DL:          {}", expressivity.dl_name());
    println!("Blocking:    {:?}", expressivity.blocking());
    println!("Guess rule:  {}", yes_no(expressivity.needs_guess_rule()));

    Ok(())
}

// =============================================================================
// CONSISTENCY COMMAND
// =============================================================================

/// Check whether the knowledge base is consistent.
pub fn cmd_consistent(session: &mut Session, json_mode: bool) -> Result<(), ReasonerError> {
    let consistent = session.kb.is_consistent()?;
    let stats = session.kb.last_stats();
    let clash = session.kb.last_clash().map(ToString::to_string);

    if json_mode {
        let output = serde_json::json!({
            "consistent": consistent,
            "clash": clash,
            "stats": stats,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Consistent: {}", yes_no(consistent));
    if let Some(clash) = clash {
        println!("Clash:      {clash}");
    }
    println!("Branches:   {}", stats.branches);
    println!("Nodes:      {}", stats.nodes_created);

    Ok(())
}

// =============================================================================
// CONCEPT QUERIES
// =============================================================================

/// Check whether a concept is satisfiable.
pub fn cmd_sat(session: &mut Session, json_mode: bool, concept: &str) -> Result<(), ReasonerError> {
    let c = parse_concept(concept)?;
    let satisfiable = session.kb.is_satisfiable(&c)?;
    let stats = session.kb.last_stats();

    if json_mode {
        let output = serde_json::json!({
            "concept": c,
            "satisfiable": satisfiable,
            "stats": stats,
        });
        print_json(&output);
        return Ok(());
    }

    println!("{c}: {}", if satisfiable { "satisfiable" } else { "unsatisfiable" });
    Ok(())
}

/// Check whether `sub` is subsumed by `sup`.
pub fn cmd_subsumes(
    session: &mut Session,
    json_mode: bool,
    sub: &str,
    sup: &str,
) -> Result<(), ReasonerError> {
    let sub = parse_concept(sub)?;
    let sup = parse_concept(sup)?;
    let subsumed = session.kb.is_sub_class_of(&sub, &sup)?;

    if json_mode {
        let output = serde_json::json!({
            "sub": sub,
            "sup": sup,
            "subsumed": subsumed,
            "stats": session.kb.last_stats(),
        });
        print_json(&output);
        return Ok(());
    }

    let relation = if subsumed { "⊑" } else { "⋢" };
    println!("{sub} {relation} {sup}");
    Ok(())
}

// =============================================================================
// INSTANCE QUERIES
// =============================================================================

/// Check whether `individual` is an instance of `concept`.
pub fn cmd_type(
    session: &mut Session,
    json_mode: bool,
    individual: &str,
    concept: &str,
) -> Result<(), ReasonerError> {
    let c = parse_concept(concept)?;
    let name = Name::new(individual);
    let member = session.kb.is_type(&name, &c)?;

    if json_mode {
        let output = serde_json::json!({
            "individual": name,
            "concept": c,
            "instance": member,
            "stats": session.kb.last_stats(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("{name} : {c}: {}", yes_no(member));
    Ok(())
}

/// List the instances of `concept`.
pub fn cmd_instances(session: &mut Session, json_mode: bool, concept: &str) -> Result<(), ReasonerError> {
    let c = parse_concept(concept)?;
    let instances = session.kb.get_instances(&c)?;

    if json_mode {
        let output = serde_json::json!({
            "concept": c,
            "instances": instances,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Instances of {c} ({}):", instances.len());
    for name in &instances {
        println!("  {name}");
    }
    Ok(())
}

// =============================================================================
// EXPLAIN COMMAND
// =============================================================================

/// Explain an inconsistency, or the unsatisfiability of `concept`.
///
/// Expects a session compiled with `explain` enabled.
pub fn cmd_explain(
    session: &mut Session,
    json_mode: bool,
    concept: Option<&str>,
) -> Result<(), ReasonerError> {
    let (subject, holds) = match concept {
        Some(arg) => {
            let c = parse_concept(arg)?;
            let satisfiable = session.kb.is_satisfiable(&c)?;
            (c.to_string(), satisfiable)
        }
        None => ("knowledge base".to_string(), session.kb.is_consistent()?),
    };
    let explanation = if holds { None } else { session.kb.explanation() };

    if json_mode {
        let output = serde_json::json!({
            "subject": subject,
            "holds": holds,
            "explanation": explanation,
        });
        print_json(&output);
        return Ok(());
    }

    match explanation {
        None if holds => println!("{subject} is satisfiable: nothing to explain"),
        None => println!("{subject} fails, but no clash was recorded"),
        Some(explanation) => {
            println!("{subject} fails because of");
            println!("{explanation}");
        }
    }
    Ok(())
}

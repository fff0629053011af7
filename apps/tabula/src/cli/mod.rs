//! # Tabula CLI Module
//!
//! This module implements the CLI interface for Tabula.
//!
//! ## Available Commands
//!
//! - `info` - Show axiom counts and expressivity
//! - `consistent` - Check knowledge-base consistency
//! - `sat` - Check concept satisfiability
//! - `subsumes` - Check a subsumption
//! - `type` - Check an individual's membership in a concept
//! - `instances` - List the instances of a concept
//! - `explain` - Explain why a check fails

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tabula_core::{BlockingKind, ReasonerConfig, ReasonerError};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tabula - tableau reasoner for expressive description logics
///
/// Loads an axiom document (JSON or TOML) and answers reasoning queries
/// over it.
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the axiom document (.json or .toml)
    #[arg(short = 'f', long, global = true, default_value = "ontology.json")]
    pub document: PathBuf,

    /// Reasoner configuration file (TOML); replaces the document's [config]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags that override single configuration fields.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Treat distinct names as distinct individuals
    #[arg(long, global = true)]
    pub unique_names: bool,

    /// Disable the satisfiability cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Disable semantic branching
    #[arg(long, global = true)]
    pub no_semantic_branching: bool,

    /// Restore by branch stamp instead of by dependency
    #[arg(long, global = true)]
    pub no_smart_restore: bool,

    /// Track axioms for explanations
    #[arg(long, global = true)]
    pub explain: bool,

    /// Per-query deadline in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Force a blocking condition
    #[arg(long, global = true, value_enum)]
    pub blocking: Option<BlockingArg>,
}

/// Blocking condition names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingArg {
    Subset,
    Equality,
    Pairwise,
}

impl From<BlockingArg> for BlockingKind {
    fn from(arg: BlockingArg) -> Self {
        match arg {
            BlockingArg::Subset => Self::Subset,
            BlockingArg::Equality => Self::Equality,
            BlockingArg::Pairwise => Self::Pairwise,
        }
    }
}

impl ConfigOverrides {
    /// Apply the flags that were given on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: ReasonerConfig) -> ReasonerConfig {
        if self.unique_names {
            config.unique_name_assumption = true;
        }
        if self.no_cache {
            config.use_cache = false;
        }
        if self.no_semantic_branching {
            config.semantic_branching = false;
        }
        if self.no_smart_restore {
            config.smart_restore = false;
        }
        if self.explain {
            config.explain = true;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = Some(ms);
        }
        if let Some(blocking) = self.blocking {
            config.blocking = Some(blocking.into());
        }
        config
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show axiom counts, expressivity and the effective configuration
    Info,

    /// Check whether the knowledge base is consistent
    Consistent,

    /// Check whether a concept is satisfiable
    Sat {
        /// Class name, or a concept in JSON form
        concept: String,
    },

    /// Check whether SUB is subsumed by SUP
    Subsumes {
        /// Subsumed concept
        sub: String,

        /// Subsuming concept
        sup: String,
    },

    /// Check whether an individual is an instance of a concept
    Type {
        /// Individual name
        individual: String,

        /// Class name, or a concept in JSON form
        concept: String,
    },

    /// List the instances of a concept
    Instances {
        /// Class name, or a concept in JSON form
        concept: String,
    },

    /// Explain why the knowledge base is inconsistent, or why a concept
    /// is unsatisfiable
    Explain {
        /// Concept to explain; the whole knowledge base if omitted
        concept: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), ReasonerError> {
    let json_mode = cli.json_mode;
    let mut overrides = cli.overrides.clone();
    if matches!(cli.command, Some(Commands::Explain { .. })) {
        overrides.explain = true;
    }
    let mut session = Session::open(&cli.document, cli.config.as_deref(), &overrides)?;

    match cli.command {
        Some(Commands::Info) => cmd_info(&session, json_mode),
        Some(Commands::Consistent) => cmd_consistent(&mut session, json_mode),
        Some(Commands::Sat { concept }) => cmd_sat(&mut session, json_mode, &concept),
        Some(Commands::Subsumes { sub, sup }) => cmd_subsumes(&mut session, json_mode, &sub, &sup),
        Some(Commands::Type {
            individual,
            concept,
        }) => cmd_type(&mut session, json_mode, &individual, &concept),
        Some(Commands::Instances { concept }) => cmd_instances(&mut session, json_mode, &concept),
        Some(Commands::Explain { concept }) => {
            cmd_explain(&mut session, json_mode, concept.as_deref())
        }
        None => {
            // No subcommand - show info by default
            cmd_info(&session, json_mode)
        }
    }
}

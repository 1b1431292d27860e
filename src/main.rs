//! # Vocab Registry CLI (`vocab`)
//!
//! The `vocab` binary resolves, inspects, and authors controlled
//! vocabularies stored in an archive directory.
//!
//! ## Usage
//!
//! ```bash
//! vocab --config ./config/vocab.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vocab load <segment>...` | Resolve a namespace, path, or uid and print the node |
//! | `vocab parse <segment>...` | Print the canonical name a path resolves to |
//! | `vocab list [namespace]` | List authorities, or the children of a node |
//! | `vocab random <collection>` | Print a random term of a collection |
//! | `vocab create <kind> <name>` | Create an authority, scope, collection, or term |
//! | `vocab status <namespace> <action>` | Accept, reject, deprecate, or reset a node |
//! | `vocab synonym <namespace> <synonym>` | Add a synonym to a node |
//! | `vocab associate <term> <other>` | Associate two terms |
//! | `vocab completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Resolve by namespace, path segments, or uid
//! vocab load wcrp:cmip6:realm:ocnbgchem
//! vocab load wcrp cmip6 realm ocean-bgc
//! vocab load 5f1e0c1a-...
//!
//! # Validate a free-form ensemble member against its collection pattern
//! vocab load wcrp cmip6 ensemble r1i1p1f1
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vocab_core::{NewNode, NodeKind, Status};
use vocab_registry::{config, edit, io, show};

/// Vocab Registry CLI: resolve and author controlled vocabularies.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, defaults are used.
#[derive(Parser)]
#[command(
    name = "vocab",
    about = "Vocab Registry: a controlled-vocabulary registry",
    version,
    long_about = "Vocab Registry stores governed vocabularies as a four-level hierarchy \
    (authority, scope, collection, term) and resolves names, synonyms, indexes, and uids \
    to their canonical nodes."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/vocab.toml")]
    config: PathBuf,

    /// Override the archive directory from `[archive].dir`.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Log filter (e.g. `info`, `vocab_core=debug`). Overrides `[log].level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve a node and print it.
    ///
    /// A single argument is tried as a colon-delimited namespace and then
    /// as a uid. Several arguments are path segments
    /// (authority, scope, collection, term).
    Load {
        /// One identifier, or up to four path segments.
        #[arg(required = true, num_args = 1..)]
        segments: Vec<String>,

        /// Print the node as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical name a path resolves to.
    Parse {
        /// One identifier, or up to four path segments.
        #[arg(required = true, num_args = 1..)]
        segments: Vec<String>,

        /// Require the last segment to already be canonical.
        #[arg(long)]
        strict: bool,

        /// Accept synonyms and other casings even if `[parse].strict` is set.
        #[arg(long, conflicts_with = "strict")]
        lenient: bool,
    },

    /// List authorities, or the children of the given node.
    List {
        /// Optional namespace or path segments.
        segments: Vec<String>,

        /// Print the nodes as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical name of a random term of a collection.
    Random {
        /// Collection namespace (e.g. `wcrp:cmip6:realm`).
        namespace: String,
    },

    /// Create a node and save its authority.
    Create {
        #[command(subcommand)]
        kind: CreateKind,
    },

    /// Change the governance status of a node.
    Status {
        /// Node namespace or uid.
        namespace: String,
        #[arg(value_enum)]
        action: StatusAction,
    },

    /// Add a synonym to a node.
    Synonym {
        /// Node namespace or uid.
        namespace: String,
        synonym: String,
    },

    /// Associate a term with another term.
    Associate {
        /// Term namespace or uid.
        term: String,
        /// Associated term namespace or uid.
        other: String,
    },

    /// Generate shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Attributes shared by every node kind.
#[derive(Args)]
struct NodeArgs {
    /// Display name; the canonical name is derived from it.
    name: String,

    #[arg(long)]
    description: Option<String>,

    /// Defaults to the name.
    #[arg(long)]
    label: Option<String>,

    #[arg(long)]
    url: Option<String>,

    /// Synonym (repeatable).
    #[arg(long = "synonym")]
    synonyms: Vec<String>,
}

impl NodeArgs {
    fn into_spec(self) -> NewNode {
        NewNode {
            name: self.name,
            description: self.description,
            label: self.label,
            url: self.url,
            synonyms: self.synonyms,
            ..Default::default()
        }
    }
}

/// Node kinds that can be created.
#[derive(Subcommand)]
enum CreateKind {
    /// Create a top-level authority.
    Authority {
        #[command(flatten)]
        node: NodeArgs,
    },
    /// Create a scope under an authority.
    Scope {
        #[command(flatten)]
        node: NodeArgs,
        /// Authority namespace.
        #[arg(long)]
        parent: String,
    },
    /// Create a collection under a scope.
    Collection {
        #[command(flatten)]
        node: NodeArgs,
        /// Scope namespace.
        #[arg(long)]
        parent: String,
        /// Pattern that virtual term names must fully match.
        #[arg(long)]
        term_regex: Option<String>,
    },
    /// Create a term under a collection.
    Term {
        #[command(flatten)]
        node: NodeArgs,
        /// Collection namespace.
        #[arg(long)]
        parent: String,
        #[arg(long)]
        alternative_name: Option<String>,
        #[arg(long)]
        alternative_url: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusAction {
    Accept,
    Reject,
    Deprecate,
    Reset,
}

impl From<StatusAction> for Status {
    fn from(action: StatusAction) -> Self {
        match action {
            StatusAction::Accept => Status::Accepted,
            StatusAction::Reject => Status::Rejected,
            StatusAction::Deprecate => Status::Deprecated,
            StatusAction::Reset => Status::Pending,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "vocab", &mut std::io::stdout());
        return Ok(());
    }

    let (mut cfg, source) = config::load_or_minimal(&cli.config)?;
    if let Some(dir) = cli.dir {
        cfg.archive.dir = dir;
    }
    init_logging(cli.log_level.as_deref().unwrap_or(&cfg.log.level));
    if source == config::ConfigSource::Defaults {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let registry = io::load_registry(&cfg.archive.dir)?;
    let dir = cfg.archive.dir.clone();

    match cli.command {
        Commands::Load { segments, json } => {
            show::run_load(&registry, &segments, json)?;
        }
        Commands::Parse {
            segments,
            strict,
            lenient,
        } => {
            let strict = match (strict, lenient) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            show::run_parse(&registry, &cfg, &segments, strict)?;
        }
        Commands::List { segments, json } => {
            show::run_list(&registry, &segments, json)?;
        }
        Commands::Random { namespace } => {
            show::run_random(&registry, &namespace)?;
        }
        Commands::Create { kind } => {
            let (node_kind, parent, spec) = match kind {
                CreateKind::Authority { node } => (NodeKind::Authority, None, node.into_spec()),
                CreateKind::Scope { node, parent } => {
                    (NodeKind::Scope, Some(parent), node.into_spec())
                }
                CreateKind::Collection {
                    node,
                    parent,
                    term_regex,
                } => (
                    NodeKind::Collection,
                    Some(parent),
                    NewNode {
                        term_regex,
                        ..node.into_spec()
                    },
                ),
                CreateKind::Term {
                    node,
                    parent,
                    alternative_name,
                    alternative_url,
                } => (
                    NodeKind::Term,
                    Some(parent),
                    NewNode {
                        alternative_name,
                        alternative_url,
                        ..node.into_spec()
                    },
                ),
            };
            let id = edit::create(&registry, node_kind, parent.as_deref(), spec)?;
            edit::persist(&registry, id, &dir)?;
            let archive = registry.read();
            if let Some(node) = archive.node(id) {
                println!("{}", archive.namespace(node));
            }
        }
        Commands::Status { namespace, action } => {
            let id = edit::set_status(&registry, &namespace, action.into())?;
            edit::persist(&registry, id, &dir)?;
            println!("{}: {}", namespace, Status::from(action));
        }
        Commands::Synonym { namespace, synonym } => {
            let (id, added) = edit::add_synonym(&registry, &namespace, &synonym)?;
            if added {
                edit::persist(&registry, id, &dir)?;
                println!("Added synonym '{}' to {}", synonym, namespace);
            } else {
                println!("Synonym '{}' already present on {}", synonym, namespace);
            }
        }
        Commands::Associate { term, other } => {
            let (id, added) = edit::associate(&registry, &term, &other)?;
            if added {
                edit::persist(&registry, id, &dir)?;
                println!("Associated {} with {}", term, other);
            } else {
                println!("{} is already associated with {}", term, other);
            }
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

//! CLI command definitions using clap.
//!
//! - chat: interactive conversation (default)
//! - tools list/add/generate/import/show: registry management

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolsession - chat with a tool-augmented agent and manage its tools
#[derive(Parser, Debug)]
#[command(name = "toolsession")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat (/reset, /tools, /quit)
    Chat,

    /// Tool registry commands
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ToolsCommands {
    /// List registered tools
    List,

    /// Register a tool from a source file
    Add {
        /// File containing the tool source
        file: PathBuf,
    },

    /// Generate tool source from a description
    Generate {
        /// What the tool should do
        description: String,

        /// Register the generated source right away
        #[arg(short, long)]
        submit: bool,
    },

    /// Import a tool from a repository file URL
    Import {
        /// e.g. https://github.com/user/repo/blob/main/tool.py
        url: String,
    },

    /// Print a tool's source
    Show {
        /// Tool name
        name: String,
    },
}

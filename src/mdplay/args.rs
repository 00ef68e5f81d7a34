use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mdplay")]
#[command(
    about = "Markdown playground: render, keep and export markdown documents",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render markdown to sanitized HTML
    #[command(alias = "r")]
    Render {
        /// File to render (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Store markdown as the current document
    Save {
        /// File to store (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Print the current document
    #[command(alias = "s")]
    Show {
        /// Print the rendered HTML instead of the markdown
        #[arg(long)]
        html: bool,
    },

    /// Load a sample as the current document
    Sample {
        /// Sample name, e.g. intro.md
        name: String,
    },

    /// List available samples
    Samples,

    /// Show or change the theme
    Theme {
        /// show, toggle, light or dark
        action: Option<String>,
    },

    /// Export the current document as a standalone HTML file
    Export {
        /// Document title
        #[arg(short, long)]
        title: Option<String>,

        /// Output file or directory (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key
        key: Option<String>,

        /// Value to set
        value: Option<String>,
    },
}

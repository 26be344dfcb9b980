mod commands;
mod config;
mod diagnostics;
mod dialect;
mod document;
mod driver;
mod error;
mod formatter;
mod markup;
mod oracle;
mod registry;
mod render;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::commands::Overrides;

#[derive(Parser)]
#[command(
    name = "pageref",
    about = "Resolve forward cross-references to page numbers by re-rendering until stable"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command.
#[derive(Args)]
struct Common {
    /// Config file to use instead of `.pageref.toml`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output dialect: `latex` or `pdf`
    #[arg(long)]
    dialect: Option<String>,
    /// Omit page annotations after links
    #[arg(long)]
    hide_pages: bool,
    /// Treat every identifier-shaped word as a candidate reference
    #[arg(long)]
    hyperlink_all: bool,
    /// Keep the leading `#` on method labels
    #[arg(long)]
    show_hash: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge and exit non-zero if any reference lacks a page
    Check {
        /// Document to render (TOML)
        document: PathBuf,
        #[command(flatten)]
        common: Common,
    },
    /// List candidate references and how they resolve
    Refs {
        /// Document to inspect (TOML)
        document: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        common: Common,
    },
    /// Converge and print the final markup
    Render {
        /// Document to render (TOML)
        document: PathBuf,
        /// Write markup here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        common: Common,
    },
}

impl From<Common> for Overrides {
    fn from(common: Common) -> Self {
        return Self {
            config: common.config,
            dialect: common.dialect,
            hide_pages: common.hide_pages,
            hyperlink_all: common.hyperlink_all,
            show_hash: common.show_hash,
        };
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| return tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { document, common } => commands::check(&document, &common.into()),
        Commands::Refs { document, json, common } => {
            commands::refs(&document, json, &common.into()).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Render { document, output, common } => {
            commands::render(&document, output.as_deref(), &common.into()).map(|()| return ExitCode::SUCCESS)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reverse-sync")]
#[command(about = "Carry MDX edits back onto Confluence storage XHTML and verify the result")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.config/reverse-sync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify one case directory
    Verify(VerifyArgs),

    /// Verify every case directory under a root
    BatchVerify(BatchVerifyArgs),

    /// Build or check lossless round-trip records
    #[command(subcommand)]
    Roundtrip(RoundtripCommands),

    /// Generate a sidecar mapping file
    Mapping(MappingArgs),

    /// Apply an MDX edit to a page
    Patch(PatchArgs),
}

#[derive(Parser)]
pub struct VerifyArgs {
    /// Directory holding original.mdx, improved.mdx and page.xhtml
    pub case_dir: PathBuf,

    /// Write actual.xhtml and diff.patch into the case directory
    #[arg(long)]
    pub write_artifacts: bool,
}

#[derive(Parser)]
pub struct BatchVerifyArgs {
    /// Root directory to scan (defaults to cases_path from the config)
    pub root: Option<PathBuf>,

    /// Only run cases whose directory name matches this glob
    #[arg(long)]
    pub pattern: Option<String>,

    /// Process cases one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Write actual.xhtml and diff.patch into each case directory
    #[arg(long)]
    pub write_artifacts: bool,
}

#[derive(Subcommand)]
pub enum RoundtripCommands {
    /// Build a round-trip record from an MDX file and its page
    Generate {
        mdx: PathBuf,
        xhtml: PathBuf,

        /// Output record path
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "")]
        page_id: String,

        /// Mapping file whose lost_info is attached to the record
        #[arg(long)]
        mapping: Option<PathBuf>,
    },

    /// Rehydrate and compare byte for byte
    Verify {
        mdx: PathBuf,
        record: PathBuf,

        /// Markup to compare against (defaults to the record's own reassembly)
        #[arg(long)]
        expected: Option<PathBuf>,
    },

    /// Rehydrate block by block and report how each block was restored
    Splice {
        mdx: PathBuf,
        record: PathBuf,

        /// Output markup path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Parser)]
pub struct MappingArgs {
    pub mdx: PathBuf,
    pub xhtml: PathBuf,

    /// Output mapping path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "")]
    pub page_id: String,
}

#[derive(Parser)]
pub struct PatchArgs {
    pub original: PathBuf,
    pub improved: PathBuf,
    pub page: PathBuf,

    /// Sidecar mapping file (generated from the inputs when omitted)
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Output markup path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print each patch's strategy and address to stderr
    #[arg(long)]
    pub show_plan: bool,
}

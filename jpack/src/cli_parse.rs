//! Command-line surface for `jpack`.
//!
//! The documented invocation is `jpack -c|-d|-t <source> [<destination>]` —
//! mode flags, not subcommand names. `clap`'s subcommand/alias machinery is
//! still the idiomatic way to get free help text, validation, and short
//! aliases, so `main` rewrites a leading `-c`/`-d`/`-t` into the matching
//! subcommand name before handing the argument vector to `clap`;
//! `compress`/`decompress`/`test` (and their `c`/`d`/`t` aliases) all route
//! here identically.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Which of the two independent codecs a run should use.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Codec {
    /// Block pipeline (BWT + MTF) feeding the semi-adaptive static Huffman
    /// coder — the primary codec.
    Bwt,
    /// Vitter's adaptive Huffman coder, run directly against the source with
    /// no intermediate file.
    Vitter,
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Bwt => write!(f, "bwt"),
            Codec::Vitter => write!(f, "vitter"),
        }
    }
}

/// Arguments shared by `compress` and `decompress`: a source file and an
/// optional destination, defaulting to `<source>.pck` when omitted.
#[derive(Debug, Clone, Args)]
pub struct CodecArgs {
    /// The file to read from.
    pub source: PathBuf,
    /// The file to write to. Defaults to `<source>.pck` when omitted.
    pub destination: Option<PathBuf>,
}

/// The main operations `jpack` supports.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compresses `source`, writing the result to `destination`.
    #[clap(alias = "c")]
    Compress(CodecArgs),
    /// Decompresses `source`, writing the result to `destination`.
    #[clap(alias = "d")]
    Decompress(CodecArgs),
    /// Round-trip self-test: compresses `<source>.txt` to `<source>.pck`,
    /// decompresses it to `<source>-R.txt`, and reports whether the two text
    /// files are identical.
    #[clap(alias = "t")]
    Test {
        /// Stem shared by `<source>.txt`, `<source>.pck`, and `<source>-R.txt`.
        source: PathBuf,
    },
}

/// The full command-line argument structure for `jpack`.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "BWT/MTF/static-Huffman file compressor with a standalone Vitter adaptive-Huffman codec.",
    long_about = "Compresses text files with a block-level Burrows-Wheeler transform, a \
Move-to-Front transform, and a semi-adaptive Huffman coder in series, and restores them \
bit-exactly via the inverse pipeline. `--codec vitter` instead runs Vitter's single-pass \
adaptive Huffman coder as an independent codec.",
    after_help = "
    COMMON USAGE:
      jpack -c|-d|-t <source> [<destination>]

    EXAMPLES:
    # 1. Compress (destination defaults to <source>.pck)
    jpack -c my_data.txt

    # 2. Decompress with statistics
    jpack -d --stats my_data.txt.pck restored.txt

    # 3. Round-trip self-test against stem.txt / stem.pck / stem-R.txt
    jpack -t stem

    # 4. Use the adaptive (Vitter) codec instead of the BWT pipeline
    jpack compress --codec vitter my_data.txt my_data.vit
"
)]
pub struct CliArgs {
    /// The operation to run and its file arguments.
    #[command(subcommand)]
    pub command: Commands,
    /// Prints a `CompressionStats` report (size, ratio, timing) after the run.
    #[arg(short, long, global = true)]
    pub stats: bool,
    /// Which codec to run.
    #[arg(long, global = true, default_value_t = Codec::Bwt)]
    pub codec: Codec,
}

/// Errors encountered while parsing or validating the command line, kept
/// distinct from `JpackError` (the engine-level taxonomy) since these never
/// originate from an engine: they're `clap` failures or file checks the CLI
/// boundary performs before any engine runs.
#[derive(Debug)]
pub enum CliError {
    /// The named input file does not exist.
    InputFileNotFound(PathBuf),
    /// An error from the argument-parsing library itself (bad flags, missing
    /// required arguments, `--help`/`--version`).
    ClapError(clap::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::InputFileNotFound(path) => {
                write!(f, "input file not found: {}", path.display())
            }
            CliError::ClapError(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<clap::Error> for CliError {
    fn from(error: clap::Error) -> Self {
        CliError::ClapError(error)
    }
}

/// Rewrites a leading `-c`/`-d`/`-t` mode flag into the matching subcommand
/// name, so the documented `jpack -c <source>` spelling and `clap`'s
/// subcommand-based parsing agree. Any other argument shape (including the
/// long `compress`/`decompress`/`test` names and their aliases) passes
/// through untouched.
pub fn rewrite_legacy_mode_flag(args: Vec<String>) -> Vec<String> {
    let Some(first) = args.get(1) else {
        return args;
    };
    let replacement = match first.as_str() {
        "-c" => Some("compress"),
        "-d" => Some("decompress"),
        "-t" => Some("test"),
        _ => None,
    };
    match replacement {
        Some(name) => {
            let mut rewritten = args;
            rewritten[1] = name.to_string();
            rewritten
        }
        None => args,
    }
}

/// Parses and validates the process's argument vector.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let raw: Vec<String> = std::env::args().collect();
    let rewritten = rewrite_legacy_mode_flag(raw);
    let args = CliArgs::try_parse_from(rewritten)?;

    let source = match &args.command {
        Commands::Compress(codec_args) | Commands::Decompress(codec_args) => &codec_args.source,
        Commands::Test { source } => source,
    };
    if matches!(args.command, Commands::Compress(_) | Commands::Decompress(_)) && !source.exists()
    {
        return Err(CliError::InputFileNotFound(source.clone()));
    }

    Ok(args)
}

impl CodecArgs {
    /// Resolves the destination path, defaulting to `<source>.pck` when
    /// none was given on the command line.
    pub fn destination_or_default(&self) -> PathBuf {
        self.destination.clone().unwrap_or_else(|| {
            let mut name = self.source.clone().into_os_string();
            name.push(shared_files::constants::COMPRESSED_EXTENSION);
            PathBuf::from(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_bare_dash_c_to_compress() {
        let args = vec!["jpack".to_string(), "-c".to_string(), "foo.txt".to_string()];
        let rewritten = rewrite_legacy_mode_flag(args);
        assert_eq!(rewritten, vec!["jpack", "compress", "foo.txt"]);
    }

    #[test]
    fn leaves_long_subcommand_names_untouched() {
        let args = vec![
            "jpack".to_string(),
            "compress".to_string(),
            "foo.txt".to_string(),
        ];
        let rewritten = rewrite_legacy_mode_flag(args.clone());
        assert_eq!(rewritten, args);
    }

    #[test]
    fn destination_defaults_to_source_plus_pck_extension() {
        let args = CodecArgs {
            source: PathBuf::from("foo.txt"),
            destination: None,
        };
        assert_eq!(args.destination_or_default(), PathBuf::from("foo.txt.pck"));
    }
}

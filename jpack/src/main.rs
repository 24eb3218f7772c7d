//! `jpack`: compresses and decompresses text files via a block-level
//! Burrows-Wheeler transform, a Move-to-Front transform, and a semi-adaptive
//! static Huffman coder composed in series, plus a standalone Vitter
//! adaptive-Huffman codec selectable with `--codec vitter`.

mod cli_parse;
mod pipeline;
mod text_io;

use anyhow::{Context, Result};
use cli_parse::{Codec, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args = match cli_parse::parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("jpack: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("jpack: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli_parse::CliArgs) -> Result<()> {
    let use_vitter = args.codec == Codec::Vitter;

    match &args.command {
        Commands::Compress(codec_args) => {
            let destination = codec_args.destination_or_default();
            let stats = if use_vitter {
                pipeline::compress_vitter(&codec_args.source, &destination)
            } else {
                pipeline::compress_bwt(&codec_args.source, &destination)
            }
            .with_context(|| {
                format!(
                    "compressing {} to {}",
                    codec_args.source.display(),
                    destination.display()
                )
            })?;
            if args.stats {
                println!("{stats}");
            }
            Ok(())
        }
        Commands::Decompress(codec_args) => {
            let destination = codec_args.destination_or_default();
            let stats = if use_vitter {
                pipeline::decompress_vitter(&codec_args.source, &destination)
            } else {
                pipeline::decompress_bwt(&codec_args.source, &destination)
            }
            .with_context(|| {
                format!(
                    "decompressing {} to {}",
                    codec_args.source.display(),
                    destination.display()
                )
            })?;
            if args.stats {
                println!("{stats}");
            }
            Ok(())
        }
        Commands::Test { source } => {
            let matches = pipeline::self_test(source, use_vitter)
                .with_context(|| format!("running self-test against {}", source.display()))?;
            if matches {
                println!("self-test passed: round-trip reproduced the source exactly");
                Ok(())
            } else {
                eprintln!("self-test failed: round-trip output differs from the source");
                anyhow::bail!("self-test round-trip mismatch for {}", source.display());
            }
        }
    }
}

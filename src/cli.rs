//! Command-line surface: a single `create SRC DEST` subcommand.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::compiler::{compile, CompileOptions};
use crate::encodings::{encode, OutputFormat};
use crate::error::CliError;
use crate::fswalk::compile_path;
use crate::watch;

/// BlobFS CLI
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a BlobFS blob from a path
    Create {
        /// Path used as a source to the BlobFS
        src: PathBuf,
        /// Destination file
        dest: PathBuf,
        /// How to encode the blob
        #[arg(long, default_value = "raw")]
        format: String,
        /// Enable file compression
        #[arg(long)]
        compress: bool,
        /// Watch for FS changes
        #[arg(long)]
        watch: bool,
        /// Store a prefix in the emitted file
        #[arg(long)]
        prefix: Option<String>,
        /// Store a suffix in the emitted file
        #[arg(long)]
        suffix: Option<String>,
    },
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Create {
            src,
            dest,
            format,
            compress,
            watch: watch_flag,
            prefix,
            suffix,
        } => {
            let format: OutputFormat = format.parse().map_err(CliError::InvalidFormat)?;

            let do_create = || -> Result<(), CliError> {
                log::info!("creating BlobFS from {}", src.display());
                let tree = compile_path(&src)?;
                let raw_blob = compile(&tree, CompileOptions { compress })?;
                let encoded = encode(&raw_blob, format);

                let mut file = std::fs::File::create(&dest)?;
                if let Some(prefix) = &prefix {
                    file.write_all(prefix.as_bytes())?;
                }
                file.write_all(&encoded)?;
                if let Some(suffix) = &suffix {
                    file.write_all(suffix.as_bytes())?;
                }

                log::info!(
                    "BlobFS created at {}, size={} bytes",
                    dest.display(),
                    raw_blob.len()
                );
                Ok(())
            };

            do_create()?;

            if watch_flag {
                watch::watch(&src, do_create)?;
            }

            Ok(())
        }
    }
}

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chunker::core::config::DEFAULT_CHUNK_MB;
use chunker::core::layout::{discover_chunks, expected_chunks, missing_chunks};
use chunker::{decode, encode, plan, read_header, ChunkConfig};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chunker",
    version,
    about = "Split files into fixed-size chunks to get around upload size limits"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file or directory into chunk files
    Encode {
        /// File or directory to encode
        infile: PathBuf,
        /// Directory to write the chunk files and header to
        outdir: PathBuf,
        /// Size of each chunk in MB
        #[arg(short = 's', long = "chunk-size", default_value_t = DEFAULT_CHUNK_MB)]
        chunk_size: u64,
    },
    /// Decode a directory of chunk files back into the original files
    Decode {
        /// Directory holding the chunk files and header
        indir: PathBuf,
        /// Directory to write the decoded files to (defaults to the current directory)
        #[arg(short = 'o', long = "outdir")]
        outdir: Option<PathBuf>,
    },
    /// Describe a chunk directory without decoding it
    Inspect {
        /// Directory holding the chunk files and header
        indir: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let result = run(cli);
    if let Err(err) = &result {
        eprintln!("error: {err:#}");
    }
    ExitCode::from(exit_status(&result))
}

/// 0 for a successful session, 1 for any failure. clap exits with 2 on
/// usage errors before a session starts.
fn exit_status(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) | Err(_) => 1,
    }
}

/// Returns whether the session succeeded.
fn run(cli: Cli) -> Result<bool> {
    let mut out = io::BufWriter::new(io::stdout());
    let ok = match cli.command {
        Commands::Encode {
            infile,
            outdir,
            chunk_size,
        } => cmd_encode(&infile, &outdir, chunk_size, &mut out)?,
        Commands::Decode { indir, outdir } => {
            let outdir = match outdir {
                Some(outdir) => outdir,
                None => std::env::current_dir().context("resolve current directory")?,
            };
            cmd_decode(&indir, &outdir, &mut out)?
        }
        Commands::Inspect { indir } => {
            cmd_inspect(&indir, &mut out)?;
            true
        }
    };
    out.flush()?;
    Ok(ok)
}

fn cmd_encode(infile: &Path, outdir: &Path, chunk_size: u64, out: &mut dyn Write) -> Result<bool> {
    let config = ChunkConfig::from_megabytes(chunk_size);
    match encode(infile, outdir, config) {
        Ok(report) => {
            writeln!(
                out,
                "Done, took {:.2} seconds.",
                report.elapsed.as_secs_f64()
            )?;
            writeln!(
                out,
                "Encoded {} files into {} chunks ({} bytes).",
                report.files, report.chunks, report.total_bytes
            )?;
            Ok(true)
        }
        Err(aborted) => {
            eprintln!("error: {}", aborted.error);
            eprintln!(
                "Error chunking files! {} files chunked into {} chunks before the failure; no header was written.",
                aborted.progress.files, aborted.progress.chunks
            );
            Ok(false)
        }
    }
}

fn cmd_decode(indir: &Path, outdir: &Path, out: &mut dyn Write) -> Result<bool> {
    match decode(indir, outdir) {
        Ok(report) => {
            writeln!(
                out,
                "Done, took {:.2} seconds.",
                report.elapsed.as_secs_f64()
            )?;
            writeln!(
                out,
                "Decoded {} files from {} chunks.",
                report.files, report.chunks
            )?;
            Ok(true)
        }
        Err(aborted) => {
            eprintln!("error: {}", aborted.error);
            eprintln!(
                "Error dechunking files! {} files decoded before the failure; written files may be corrupt.",
                aborted.progress.files
            );
            Ok(false)
        }
    }
}

fn cmd_inspect(indir: &Path, out: &mut dyn Write) -> Result<()> {
    let header = read_header(indir)
        .with_context(|| format!("read header in {}", indir.display()))?;
    let expected = expected_chunks(header.total_bytes, header.capacity);
    let present = discover_chunks(indir)?;
    let missing = missing_chunks(indir, &header)?;

    writeln!(out, "dir={}", indir.display())?;
    writeln!(
        out,
        "bytes_per_chunk={} total_bytes={} files={}",
        header.capacity,
        header.total_bytes,
        header.positions.len()
    )?;
    writeln!(
        out,
        "chunks_expected={} chunks_present={} chunks_missing={:?}",
        expected,
        present.len(),
        missing
    )?;
    for span in plan(&header) {
        writeln!(
            out,
            "file name={} offset={} length={}",
            span.name, span.offset, span.length
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunker::core::layout::{chunk_path, header_path};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(true)), 0);
        assert_eq!(exit_status(&Ok(false)), 1);
        assert_eq!(exit_status(&Err(anyhow::anyhow!("boom"))), 1);

        let usage = Cli::try_parse_from(["chunker", "encode", "in", "out", "-s", "abc"])
            .err()
            .unwrap();
        assert_eq!(usage.exit_code(), 2);
    }

    #[test]
    fn test_cmd_encode_reports_abort() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let ok = cmd_encode(&dir.path().join("absent"), dir.path(), 1, &mut out).unwrap();
        assert!(!ok);
        assert!(out.is_empty());
        assert!(!header_path(dir.path()).exists());
    }

    #[test]
    fn test_cmd_decode_reports_abort() {
        let chunks = TempDir::new().unwrap();
        let restored = TempDir::new().unwrap();
        let mut out = Vec::new();
        let ok = cmd_decode(chunks.path(), restored.path(), &mut out).unwrap();
        assert!(!ok);
        assert!(out.is_empty());
    }

    #[test]
    fn test_encode_decode_inspect() {
        let src = TempDir::new().unwrap();
        let chunks = TempDir::new().unwrap();
        let restored = TempDir::new().unwrap();
        let file = src.path().join("payload");
        fs::write(&file, vec![3u8; 10]).unwrap();

        let mut out = Vec::new();
        assert!(cmd_encode(&file, chunks.path(), 1, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Done, took"));

        let mut out = Vec::new();
        assert!(cmd_decode(chunks.path(), restored.path(), &mut out).unwrap());
        assert_eq!(fs::read(restored.path().join("payload")).unwrap(), vec![3u8; 10]);

        fs::remove_file(chunk_path(chunks.path(), 0)).unwrap();
        let mut out = Vec::new();
        cmd_inspect(chunks.path(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("chunks_expected=1 chunks_present=0 chunks_missing=[0]"));
        assert!(text.contains("file name=payload offset=0 length=10"));
    }
}

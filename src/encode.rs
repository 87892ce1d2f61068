//! Encode workflow: input path → chunk files + header.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::core::layout::header_path;
use crate::core::{write_header, Aborted, ChunkConfig, ChunkWriter, Error, Result};
use crate::enumerate::{enumerate, InputSet};

/// Work done by an encode session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeReport {
    /// Files fully consumed into the chunk stream.
    pub files: usize,
    /// Chunk files created.
    pub chunks: u64,
    /// Logical stream length.
    pub total_bytes: u64,
    pub elapsed: Duration,
}

/// Encode `input` (a file or a directory tree) into `output_dir`.
///
/// The header file is written last; if it is absent the session failed, even
/// when chunk files are present.
pub fn encode(
    input: &Path,
    output_dir: &Path,
    config: ChunkConfig,
) -> std::result::Result<EncodeReport, Aborted<EncodeReport>> {
    let prepare = || -> Result<InputSet> {
        require_dir(output_dir)?;
        enumerate(input)
    };
    let inputs = prepare().map_err(|err| Aborted::new(err, EncodeReport::default()))?;
    info!(
        "encoding {} file(s) from {} into {}",
        inputs.len(),
        inputs.root.display(),
        output_dir.display()
    );
    encode_inputs(&inputs, output_dir, config)
}

/// Encode an explicit input set, in the order given.
pub fn encode_inputs(
    inputs: &InputSet,
    output_dir: &Path,
    config: ChunkConfig,
) -> std::result::Result<EncodeReport, Aborted<EncodeReport>> {
    let started = Instant::now();
    let mut report = EncodeReport::default();

    // A header left by an earlier session would describe the old chunks.
    if let Err(err) = remove_stale_header(output_dir) {
        return Err(Aborted::new(err, report));
    }

    let mut writer = match ChunkWriter::open(output_dir, config) {
        Ok(writer) => writer,
        Err(err) => return Err(Aborted::new(err, report)),
    };

    let consumed = consume_all(&mut writer, inputs, &mut report);

    // The writer is closed on every path; its handle must not outlive the session.
    let finished = writer.finish();
    report.chunks = writer.chunks_written();
    report.total_bytes = writer.offset();

    let committed = consumed.and(finished).and_then(|summary| {
        let header = summary.into_header();
        write_header(output_dir, &header)
    });
    report.elapsed = started.elapsed();

    match committed {
        Ok(()) => {
            info!(
                "encoded {} file(s) into {} chunk(s), {} bytes in {:.2}s",
                report.files,
                report.chunks,
                report.total_bytes,
                report.elapsed.as_secs_f64()
            );
            Ok(report)
        }
        Err(err) => {
            warn!(
                "encode aborted after {} file(s), {} chunk(s) left on disk: {}",
                report.files, report.chunks, err
            );
            Err(Aborted::new(err, report))
        }
    }
}

fn consume_all(
    writer: &mut ChunkWriter,
    inputs: &InputSet,
    report: &mut EncodeReport,
) -> Result<()> {
    for name in &inputs.names {
        let path = inputs.path_of(name);
        let mut source =
            File::open(&path).map_err(|err| Error::source_read(path.display(), err))?;
        let bytes = writer.consume(name, &mut source)?;
        report.files += 1;
        info!("chunked '{}' as '{}' ({} bytes)", path.display(), name, bytes);
    }
    Ok(())
}

fn remove_stale_header(output_dir: &Path) -> Result<()> {
    let path = header_path(output_dir);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            info!("removed previous header {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::sink_write(path.display(), err)),
    }
}

pub(crate) fn require_dir(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::InputNotFound(path.to_path_buf()))
        }
        Err(err) => Err(Error::source_read(path.display(), err)),
    }
}

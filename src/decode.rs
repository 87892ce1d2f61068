//! Decode workflow: header + chunk files → original files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::core::{read_header, Aborted, ChunkReader, Error, Header, Result};
use crate::encode::require_dir;

/// One file's slice of the logical stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpan {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

/// Work done by a decode session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Files completely reconstructed.
    pub files: usize,
    /// Chunk files opened.
    pub chunks: u64,
    /// Bytes extracted from the chunk stream.
    pub total_bytes: u64,
    pub elapsed: Duration,
}

/// Order the header's positions by offset and derive each file's length.
///
/// Files sharing an offset keep their header order, so a zero-length file
/// recorded before its successor stays ahead of it.
pub fn plan(header: &Header) -> Vec<FileSpan> {
    let mut positions: Vec<_> = header.positions.iter().collect();
    positions.sort_by_key(|position| position.offset);

    let ends = positions
        .iter()
        .skip(1)
        .map(|next| next.offset)
        .chain(std::iter::once(header.total_bytes));

    positions
        .iter()
        .zip(ends)
        .map(|(position, end)| FileSpan {
            name: position.name.clone(),
            offset: position.offset,
            length: end.saturating_sub(position.offset),
        })
        .collect()
}

/// Rebuild the files described by `input_dir/header` under `output_dir`.
pub fn decode(
    input_dir: &Path,
    output_dir: &Path,
) -> std::result::Result<DecodeReport, Aborted<DecodeReport>> {
    let started = Instant::now();
    let mut report = DecodeReport::default();

    let prepare = || -> Result<Header> {
        require_dir(output_dir)?;
        require_dir(input_dir)?;
        read_header(input_dir)
    };
    let header = prepare().map_err(|err| Aborted::new(err, DecodeReport::default()))?;
    let spans = plan(&header);
    info!(
        "decoding {} file(s), {} bytes in chunks of {} from {}",
        spans.len(),
        header.total_bytes,
        header.capacity,
        input_dir.display()
    );

    let mut reader = match ChunkReader::open(input_dir) {
        Ok(reader) => reader,
        Err(err) => return Err(Aborted::new(err, report)),
    };
    let result = extract_all(&mut reader, &spans, output_dir, &mut report);
    report.total_bytes = reader.bytes_read();
    report.chunks = reader.finish();
    report.elapsed = started.elapsed();

    match result {
        Ok(()) => {
            info!(
                "decoded {} file(s) from {} chunk(s) in {:.2}s",
                report.files,
                report.chunks,
                report.elapsed.as_secs_f64()
            );
            Ok(report)
        }
        Err(err) => {
            warn!(
                "decode aborted after {} file(s); written files may be incomplete: {}",
                report.files, err
            );
            Err(Aborted::new(err, report))
        }
    }
}

fn extract_all(
    reader: &mut ChunkReader,
    spans: &[FileSpan],
    output_dir: &Path,
    report: &mut DecodeReport,
) -> Result<()> {
    for span in spans {
        let path = output_dir.join(&span.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::sink_write(parent.display(), err))?;
        }
        let file = File::create(&path).map_err(|err| Error::sink_write(path.display(), err))?;
        let mut out = BufWriter::new(file);
        reader.extract(span.length, &mut out).map_err(|err| match err {
            Error::SinkWrite { source, .. } => Error::sink_write(path.display(), source),
            other => other,
        })?;
        out.flush()
            .map_err(|err| Error::sink_write(path.display(), err))?;
        report.files += 1;
        info!("wrote '{}' as '{}'", span.name, path.display());
    }
    Ok(())
}

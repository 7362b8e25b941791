//! Utilities for creating `rodio` sinks from a file path.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub(super) enum SinkError {
    #[error("cannot open file: {0}")]
    Open(#[from] std::io::Error),
    #[error("cannot decode file: {0}")]
    Decode(#[from] DecoderError),
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
///
/// Also returns the total duration when the decoder knows it.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), SinkError> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))?;
    let total = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    Ok((sink, total))
}

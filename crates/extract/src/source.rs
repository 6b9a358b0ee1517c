//! Archive byte sources.
//!
//! Both sources hand their bytes to the parser through a bounded channel:
//! the async side produces chunks, the blocking side consumes them through
//! [`ChunkReader`]. The channel bound is what provides back-pressure when
//! the parser falls behind the network.

use bytes::{Buf, Bytes};
use futures::StreamExt;
use std::io::{self, Read};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use gitsdk_core::{Error, Result};

/// External download helper used instead of the built-in HTTP client.
const DOWNLOAD_HELPER: &str = "curl";

/// Capacity, in chunks, of the producer/parser channel.
const CHANNEL_CAPACITY: usize = 16;

/// Read buffer size for the helper's stdout.
const HELPER_BUF_SIZE: usize = 64 * 1024;

/// Blocking `Read` over the chunk channel.
///
/// Returns EOF once the producing side is dropped and all chunks are
/// consumed; a transport error surfaces as an IO error on the read that
/// reaches it.
pub(crate) struct ChunkReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    fn new(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.current.has_remaining() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.remaining());
        self.current.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

/// Issue a streaming GET for `url` and forward the body into the channel.
pub(crate) async fn http_source(
    client: &reqwest::Client,
    url: &str,
) -> Result<(ChunkReader, JoinHandle<()>)> {
    debug!(%url, "Requesting artifact archive");

    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::http_status(
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        ));
    }

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let mut stream = response.bytes_stream();
    let producer = tokio::spawn(async move {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(io::Error::other);
            let failed = chunk.is_err();
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    });

    Ok((ChunkReader::new(rx), producer))
}

/// Spawn the external download helper for `url` and forward its stdout into
/// the channel.
///
/// Also returns the child so the caller can check its exit status once the
/// stream is drained.
pub(crate) fn helper_source(url: &str) -> Result<(ChunkReader, JoinHandle<()>, Child)> {
    debug!(%url, helper = DOWNLOAD_HELPER, "Spawning download helper");

    let mut child = Command::new(DOWNLOAD_HELPER)
        .args(["-sSfL", url])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| Error::extraction(format!("failed to spawn {DOWNLOAD_HELPER}: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::extraction("download helper has no stdout"))?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let producer = tokio::spawn(async move {
        let mut buf = vec![0u8; HELPER_BUF_SIZE];
        loop {
            match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    Ok((ChunkReader::new(rx), producer, child))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_reader_concatenates_chunks() {
        let (tx, rx) = mpsc::channel(4);
        tx.blocking_send(Ok(Bytes::from_static(b"hello ")))
            .unwrap();
        tx.blocking_send(Ok(Bytes::from_static(b"world"))).unwrap();
        drop(tx);

        let mut reader = ChunkReader::new(rx);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn chunk_reader_surfaces_transport_errors() {
        let (tx, rx) = mpsc::channel(4);
        tx.blocking_send(Ok(Bytes::from_static(b"partial"))).unwrap();
        tx.blocking_send(Err(io::Error::other("connection reset")))
            .unwrap();
        drop(tx);

        let mut reader = ChunkReader::new(rx);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn chunk_reader_eof_on_closed_channel() {
        let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(1);
        drop(tx);

        let mut reader = ChunkReader::new(rx);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}

//! # Tarballs and Tarball Streams (`fetch::tarball`)
//!
//! File: cli/src/fetch/tarball.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A `Tarball` pairs an archive name (`<owner>-<name>-<short>.tar.gz`) with a
//! `TarballStream`, a single-use lazy stream of gzip bytes.
//!
//! ## Lifecycle
//!
//! A stream may own an `EphemeralWorkspace` (the git fallback's clone plus the
//! archive file it is reading from). The workspace is released exactly once,
//! on whichever of these happens first:
//!
//! - the stream yields its end,
//! - the stream yields an error,
//! - the consumer calls `cancel()`,
//! - the stream is dropped.
//!
//! After that the stream only yields `None`; it cannot be replayed.
//!
use super::workspace::EphemeralWorkspace;
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// An archive produced by a fetcher.
#[derive(Debug)]
pub struct Tarball {
    /// `<owner>-<name>-<short>.tar.gz`
    pub name: String,
    pub body: TarballStream,
}

/// Lazy, cancelable, single-consumption stream of archive bytes.
pub struct TarballStream {
    inner: Option<ByteStream>,
    workspace: Option<EphemeralWorkspace>,
}

impl TarballStream {
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(inner)),
            workspace: None,
        }
    }

    /// Streams `file` in fixed-size chunks, releasing `workspace` when done.
    pub fn from_file(file: tokio::fs::File, workspace: EphemeralWorkspace) -> Self {
        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            Ok(Some((Bytes::from(buf), file)))
        });
        Self {
            inner: Some(Box::pin(chunks)),
            workspace: Some(workspace),
        }
    }

    /// In-memory stream, handy for tests and small payloads.
    #[cfg(test)]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::new(stream::iter(vec![Ok(Bytes::from(data))]))
    }

    /// Stops reading and releases any owned workspace. Never fails.
    pub fn cancel(mut self) {
        self.finish();
    }

    /// True once the stream has ended, errored or been canceled.
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    fn finish(&mut self) {
        self.inner = None;
        if let Some(mut workspace) = self.workspace.take() {
            workspace.release();
        }
    }
}

impl Stream for TarballStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl Drop for TarballStream {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for TarballStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarballStream")
            .field("finished", &self.is_finished())
            .field(
                "workspace",
                &self.workspace.as_ref().map(|w| w.path().to_path_buf()),
            )
            .finish()
    }
}

//! Output sinks for fully rendered pages.
//!
//! The registry never looks at headers, status codes or anything else a host
//! response may carry; it only appends the final page body. Hosts adapt their
//! own response type by implementing [`OutputSink`].

use std::io::{self, Write};

/// Something a rendered page body can be appended to.
pub trait OutputSink {
    /// Appends `chunk` to the body.
    fn write_body(&mut self, chunk: &str) -> io::Result<()>;
}

impl OutputSink for String {
    fn write_body(&mut self, chunk: &str) -> io::Result<()> {
        self.push_str(chunk);
        Ok(())
    }
}

impl OutputSink for Vec<u8> {
    fn write_body(&mut self, chunk: &str) -> io::Result<()> {
        self.extend_from_slice(chunk.as_bytes());
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write_body(&mut self, chunk: &str) -> io::Result<()> {
        (**self).write_body(chunk)
    }
}

/// Adapts any [`io::Write`] (stdout, a file, a socket) into an [`OutputSink`].
#[derive(Debug)]
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flushes and returns the wrapped writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> OutputSink for IoSink<W> {
    fn write_body(&mut self, chunk: &str) -> io::Result<()> {
        self.inner.write_all(chunk.as_bytes())
    }
}

//! Upstream fragment sources.
//!
//! - [`FragmentSource`] - Pull-based source of byte fragments
//! - [`ReaderSource`] - Fragments read from a [`std::io::Read`]
//! - [`IterSource`] - Fragments taken from an iterator
//!
//! A source hands out one fragment per [`FragmentSource::pull`] call, so
//! at most one request is ever outstanding. Fragment sizes are chosen by
//! the source and carry no meaning for the stage.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// A lazy, finite, ordered sequence of byte fragments.
pub trait FragmentSource {
    /// Produces the next fragment.
    ///
    /// Returns `None` at end of stream and `Some(Err(_))` on failure.
    /// Retrying failed reads is the source's own business; the stage
    /// treats any error as fatal.
    fn pull(&mut self) -> Option<io::Result<Bytes>>;

    /// Releases any resource held by the source (file handles, sockets).
    ///
    /// Called when the consumer cancels or the stream terminates. After
    /// release, `pull` returns `None`.
    fn release(&mut self) {}
}

impl<F: FragmentSource + ?Sized> FragmentSource for Box<F> {
    fn pull(&mut self) -> Option<io::Result<Bytes>> {
        (**self).pull()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// A source reading fragments of up to `read_size` bytes from a reader.
///
/// The reader is dropped on end of stream or on release.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
    read_size: usize,
    buf: BytesMut,
}

impl<R: Read> ReaderSource<R> {
    /// Creates a source reading at most `read_size` bytes per fragment.
    ///
    /// A `read_size` of zero is treated as one byte.
    pub fn new(reader: R, read_size: usize) -> Self {
        Self {
            reader: Some(reader),
            read_size: read_size.max(1),
            buf: BytesMut::new(),
        }
    }

    /// Returns true once the reader has been dropped.
    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: Read> FragmentSource for ReaderSource<R> {
    fn pull(&mut self) -> Option<io::Result<Bytes>> {
        let reader = self.reader.as_mut()?;
        self.buf.resize(self.read_size, 0);

        let result = loop {
            match reader.read(&mut self.buf[..]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match result {
            Ok(0) => {
                self.reader = None;
                None
            }
            Ok(n) => {
                self.buf.truncate(n);
                Some(Ok(self.buf.split().freeze()))
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn release(&mut self) {
        self.reader = None;
        self.buf = BytesMut::new();
    }
}

/// A source taking fragments from an iterator of `io::Result<Bytes>`.
#[derive(Debug)]
pub struct IterSource<I> {
    iter: Option<I>,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    /// Wraps an iterator.
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: Some(iter.into_iter()),
        }
    }

    /// Returns true once the iterator has been dropped.
    pub fn is_released(&self) -> bool {
        self.iter.is_none()
    }
}

impl<I> FragmentSource for IterSource<I>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    fn pull(&mut self) -> Option<io::Result<Bytes>> {
        self.iter.as_mut()?.next()
    }

    fn release(&mut self) {
        self.iter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Fails with `Interrupted` once before every successful read.
    struct Flaky<R> {
        inner: R,
        interrupt: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    fn collect<S: FragmentSource>(source: &mut S) -> Vec<Bytes> {
        std::iter::from_fn(|| source.pull())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_reader_source_respects_read_size() {
        let data: Vec<u8> = (0..10).collect();
        let mut source = ReaderSource::new(Cursor::new(data), 4);

        let fragments = collect(&mut source);
        let sizes: Vec<_> = fragments.iter().map(|f| f.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert!(source.is_released());
        assert!(source.pull().is_none());
    }

    #[test]
    fn test_reader_source_retries_interrupted() {
        let reader = Flaky {
            inner: Cursor::new(b"hello".to_vec()),
            interrupt: false,
        };
        let mut source = ReaderSource::new(reader, 8);
        let fragments = collect(&mut source);
        assert_eq!(fragments, vec![Bytes::from_static(b"hello")]);
    }

    #[test]
    fn test_reader_source_release() {
        let mut source = ReaderSource::new(Cursor::new(b"abc".to_vec()), 1);
        assert_eq!(source.pull().unwrap().unwrap(), Bytes::from_static(b"a"));
        source.release();
        assert!(source.is_released());
        assert!(source.pull().is_none());
    }

    #[test]
    fn test_zero_read_size_reads_single_bytes() {
        let mut source = ReaderSource::new(Cursor::new(b"ab".to_vec()), 0);
        assert_eq!(collect(&mut source).len(), 2);
    }

    #[test]
    fn test_iter_source() {
        let fragments = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("boom")),
        ];
        let mut source: Box<dyn FragmentSource> = Box::new(IterSource::new(fragments));

        assert_eq!(source.pull().unwrap().unwrap(), Bytes::from_static(b"ab"));
        assert!(source.pull().unwrap().is_err());
        assert!(source.pull().is_none());
    }

    #[test]
    fn test_iter_source_release() {
        let mut source = IterSource::new(vec![Ok(Bytes::from_static(b"ab"))]);
        source.release();
        assert!(source.is_released());
        assert!(source.pull().is_none());
    }
}

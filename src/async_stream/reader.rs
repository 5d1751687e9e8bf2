//! Fragment stream over an `AsyncRead`.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

pin_project! {
    /// A stream of fragments read from an async reader.
    ///
    /// Each fragment holds at most `read_size` bytes. The stream ends when
    /// the reader reports end of file.
    #[derive(Debug)]
    pub struct ReadFragments<R> {
        #[pin]
        reader: R,
        buf: BytesMut,
        read_size: usize,
        eof: bool,
    }
}

impl<R: AsyncRead> ReadFragments<R> {
    /// Creates a fragment stream reading at most `read_size` bytes at a time.
    ///
    /// A `read_size` of zero is treated as one byte.
    pub fn new(reader: R, read_size: usize) -> Self {
        Self {
            reader,
            buf: BytesMut::new(),
            read_size: read_size.max(1),
            eof: false,
        }
    }
}

impl<R: AsyncRead> Stream for ReadFragments<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.eof {
            return Poll::Ready(None);
        }

        this.buf.resize(*this.read_size, 0);
        match this.reader.poll_read(cx, &mut this.buf[..]) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(0)) => {
                *this.eof = true;
                *this.buf = BytesMut::new();
                Poll::Ready(None)
            }
            Poll::Ready(Ok(n)) => {
                this.buf.truncate(n);
                Poll::Ready(Some(Ok(this.buf.split().freeze())))
            }
            Poll::Ready(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
        }
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const DEFAULT_COPY_BUFFER_SIZE: usize = 16 * 1024; // 16KB
const MINIMAL_COPY_BUFFER_SIZE: usize = 4 * 1024; // 4KB
const MINIMAL_READ_BUFFER_SIZE: usize = 256; // 256B
const DEFAULT_COPY_YIELD_SIZE: usize = 1024 * 1024; // 1MB
const MINIMAL_COPY_YIELD_SIZE: usize = 256 * 1024; // 256KB

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamCopyConfig {
    buffer_size: usize,
    yield_size: usize,
}

impl Default for StreamCopyConfig {
    fn default() -> Self {
        StreamCopyConfig {
            buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            yield_size: DEFAULT_COPY_YIELD_SIZE,
        }
    }
}

impl StreamCopyConfig {
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size.max(MINIMAL_COPY_BUFFER_SIZE);
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn set_yield_size(&mut self, yield_size: usize) {
        self.yield_size = yield_size.max(MINIMAL_COPY_YIELD_SIZE);
    }

    #[inline]
    pub fn yield_size(&self) -> usize {
        self.yield_size
    }
}

#[derive(Error, Debug)]
pub enum StreamCopyError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
}

/// Bytes written out by one copy direction, shared with observers.
#[derive(Clone, Debug, Default)]
pub struct CopiedBytes(Arc<AtomicU64>);

impl CopiedBytes {
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    fn add(&self, n: usize) {
        self.0.fetch_add(n as u64, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct StreamCopyBuffer {
    read_done: bool,
    buf: Box<[u8]>,
    yield_size: usize,
    r_off: usize,
    w_off: usize,
    total_write: u64,
    need_flush: bool,
    copied: CopiedBytes,
}

impl StreamCopyBuffer {
    fn new(config: &StreamCopyConfig) -> Self {
        StreamCopyBuffer {
            read_done: false,
            buf: vec![0; config.buffer_size].into_boxed_slice(),
            yield_size: config.yield_size,
            r_off: 0,
            w_off: 0,
            total_write: 0,
            need_flush: false,
            copied: CopiedBytes::default(),
        }
    }

    fn with_data(config: &StreamCopyConfig, mut buf: Vec<u8>) -> Self {
        let r_off = buf.len();
        if buf.capacity() < config.buffer_size {
            buf.resize(config.buffer_size, 0);
        } else {
            buf.resize(buf.capacity(), 0);
        }
        StreamCopyBuffer {
            read_done: false,
            buf: buf.into_boxed_slice(),
            yield_size: config.yield_size,
            r_off,
            w_off: 0,
            total_write: 0,
            need_flush: false,
            copied: CopiedBytes::default(),
        }
    }

    fn poll_fill_buf<R>(
        &mut self,
        cx: &mut Context<'_>,
        reader: Pin<&mut R>,
    ) -> Poll<io::Result<()>>
    where
        R: AsyncRead + ?Sized,
    {
        let mut read_buf = ReadBuf::new(&mut self.buf[self.r_off..]);
        let res = reader.poll_read(cx, &mut read_buf);
        if let Poll::Ready(Ok(_)) = res {
            let nr = read_buf.filled().len();
            if nr == 0 {
                self.read_done = true;
            } else {
                self.r_off += nr;
            }
        }
        res
    }

    fn check_move_cache(&mut self) {
        let left = self.r_off - self.w_off;
        if left <= self.w_off {
            // move the pending bytes to the front, so we can read more
            self.buf.copy_within(self.w_off..self.r_off, 0);
            self.w_off = 0;
            self.r_off = left;
        }
    }

    fn poll_write_buf<R, W>(
        &mut self,
        cx: &mut Context<'_>,
        reader: Pin<&mut R>,
        writer: Pin<&mut W>,
    ) -> Poll<Result<usize, StreamCopyError>>
    where
        R: AsyncRead + ?Sized,
        W: AsyncWrite + ?Sized,
    {
        match writer.poll_write(cx, &self.buf[self.w_off..self.r_off]) {
            Poll::Pending => {
                // top up the buffer while the writer is blocked
                if !self.read_done {
                    self.check_move_cache();
                    if self.r_off + MINIMAL_READ_BUFFER_SIZE <= self.buf.len() {
                        ready!(self.poll_fill_buf(cx, reader))
                            .map_err(StreamCopyError::ReadFailed)?;
                    }
                }
                Poll::Pending
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(StreamCopyError::WriteFailed(e))),
            Poll::Ready(Ok(0)) => Poll::Ready(Err(StreamCopyError::WriteFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                "write zero byte into writer",
            )))),
            Poll::Ready(Ok(n)) => {
                self.w_off += n;
                self.total_write += n as u64;
                self.copied.add(n);
                self.need_flush = true;
                Poll::Ready(Ok(n))
            }
        }
    }

    fn poll_copy<R, W>(
        &mut self,
        cx: &mut Context<'_>,
        mut reader: Pin<&mut R>,
        mut writer: Pin<&mut W>,
    ) -> Poll<Result<u64, StreamCopyError>>
    where
        R: AsyncRead + ?Sized,
        W: AsyncWrite + ?Sized,
    {
        let mut copy_this_round = 0usize;
        loop {
            if !self.read_done {
                if self.w_off == self.r_off {
                    self.w_off = 0;
                    self.r_off = 0;
                }

                if self.w_off != 0 {
                    self.check_move_cache();
                }
                if self.r_off < self.buf.len() {
                    match self.poll_fill_buf(cx, reader.as_mut()) {
                        Poll::Ready(Ok(_)) => {}
                        Poll::Ready(Err(e)) => {
                            return Poll::Ready(Err(StreamCopyError::ReadFailed(e)));
                        }
                        Poll::Pending => {
                            if self.w_off >= self.r_off {
                                // nothing to write, flush once before sleeping
                                if self.need_flush {
                                    self.need_flush = false;
                                    ready!(writer.as_mut().poll_flush(cx))
                                        .map_err(StreamCopyError::WriteFailed)?;
                                }

                                return Poll::Pending;
                            }
                        }
                    }
                }
            }

            while self.w_off < self.r_off {
                let i = ready!(self.poll_write_buf(cx, reader.as_mut(), writer.as_mut()))?;
                copy_this_round += i;
            }

            if self.read_done {
                if self.need_flush {
                    ready!(writer.as_mut().poll_flush(cx)).map_err(StreamCopyError::WriteFailed)?;
                    self.need_flush = false;
                }
                return Poll::Ready(Ok(self.total_write));
            }

            if copy_this_round >= self.yield_size {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
        }
    }
}

/// Copy all bytes from `reader` to `writer`, and shutdown the writer at reader EOF.
///
/// Both ends are owned, so the future can be spawned as a standalone task.
#[derive(Debug)]
pub struct StreamCopy<R, W> {
    reader: R,
    writer: W,
    buf: StreamCopyBuffer,
    shutdown_done: bool,
}

impl<R, W> StreamCopy<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: &StreamCopyConfig) -> Self {
        StreamCopy {
            reader,
            writer,
            buf: StreamCopyBuffer::new(config),
            shutdown_done: false,
        }
    }

    /// Send `data` first, which has already been read out of `reader`.
    pub fn with_data(reader: R, writer: W, config: &StreamCopyConfig, data: Vec<u8>) -> Self {
        StreamCopy {
            reader,
            writer,
            buf: StreamCopyBuffer::with_data(config, data),
            shutdown_done: false,
        }
    }

    pub fn copied_bytes(&self) -> CopiedBytes {
        self.buf.copied.clone()
    }
}

impl<R, W> Future for StreamCopy<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    type Output = Result<u64, StreamCopyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<u64, StreamCopyError>> {
        let me = &mut *self;

        let total = ready!(me.buf.poll_copy(
            cx,
            Pin::new(&mut me.reader),
            Pin::new(&mut me.writer)
        ))?;
        if !me.shutdown_done {
            ready!(Pin::new(&mut me.writer).poll_shutdown(cx))
                .map_err(StreamCopyError::WriteFailed)?;
            me.shutdown_done = true;
        }
        Poll::Ready(Ok(total))
    }
}

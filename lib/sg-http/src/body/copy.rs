/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite};

use sg_io_ext::{LimitedBufReadExt, LimitedWriteExt};

use super::HttpBodyType;
use crate::{HttpChunkedLine, HttpLineParseError};

#[derive(Debug, Error)]
pub enum HttpBodyCopyError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("unexpected eof")]
    UnexpectedEof,
    #[error("invalid chunked body: {0}")]
    InvalidChunkedBody(HttpLineParseError),
}

/// Copy one message body as is, including the chunked framing and trailers.
///
/// Nothing after the end of the body is read from `reader`.
/// Return the number of bytes written.
pub async fn copy_body<R, W>(
    reader: &mut R,
    writer: &mut W,
    body_type: HttpBodyType,
    body_line_max_len: usize,
) -> Result<u64, HttpBodyCopyError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match body_type {
        HttpBodyType::ContentLength(size) => copy_fixed(reader, writer, size).await,
        HttpBodyType::ChunkedWithoutTrailer | HttpBodyType::ChunkedWithTrailer => {
            copy_chunked(reader, writer, body_line_max_len).await
        }
    }
}

async fn copy_fixed<R, W>(
    reader: &mut R,
    writer: &mut W,
    size: u64,
) -> Result<u64, HttpBodyCopyError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut limited = (&mut *reader).take(size);
    let mut copied = 0u64;
    loop {
        let buf = limited
            .fill_buf()
            .await
            .map_err(HttpBodyCopyError::ReadFailed)?;
        if buf.is_empty() {
            break;
        }
        let len = buf.len();
        writer
            .write_all_flush(buf)
            .await
            .map_err(HttpBodyCopyError::WriteFailed)?;
        limited.consume(len);
        copied += len as u64;
    }
    if copied < size {
        return Err(HttpBodyCopyError::UnexpectedEof);
    }
    Ok(copied)
}

async fn read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_len: usize,
) -> Result<(), HttpBodyCopyError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let (found, nr) = reader
        .limited_read_until(b'\n', max_len, buf)
        .await
        .map_err(HttpBodyCopyError::ReadFailed)?;
    if found {
        Ok(())
    } else if nr < max_len {
        Err(HttpBodyCopyError::UnexpectedEof)
    } else {
        Err(HttpBodyCopyError::InvalidChunkedBody(
            HttpLineParseError::LineTooLong(max_len),
        ))
    }
}

fn is_end_line(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

async fn copy_chunked<R, W>(
    reader: &mut R,
    writer: &mut W,
    line_max_len: usize,
) -> Result<u64, HttpBodyCopyError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::with_capacity(64);
    let mut copied = 0u64;

    loop {
        read_line(reader, &mut line, line_max_len).await?;
        let chunk =
            HttpChunkedLine::parse(&line).map_err(HttpBodyCopyError::InvalidChunkedBody)?;
        let chunk_size = chunk.chunk_size;
        writer
            .write_all_flush(&line)
            .await
            .map_err(HttpBodyCopyError::WriteFailed)?;
        copied += line.len() as u64;

        if chunk_size == 0 {
            break;
        }

        copied += copy_fixed(reader, writer, chunk_size).await?;

        read_line(reader, &mut line, line_max_len).await?;
        if !is_end_line(&line) {
            return Err(HttpBodyCopyError::InvalidChunkedBody(
                HttpLineParseError::InvalidChunkSize,
            ));
        }
        writer
            .write_all_flush(&line)
            .await
            .map_err(HttpBodyCopyError::WriteFailed)?;
        copied += line.len() as u64;
    }

    // trailer fields, end with an empty line
    loop {
        read_line(reader, &mut line, line_max_len).await?;
        writer
            .write_all_flush(&line)
            .await
            .map_err(HttpBodyCopyError::WriteFailed)?;
        copied += line.len() as u64;
        if is_end_line(&line) {
            break;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn content_length() {
        let stream = tokio_test::io::Builder::new()
            .read(b"hello ")
            .read(b"worldGET /next")
            .build();
        let mut reader = BufReader::new(stream);
        let mut writer = Vec::new();
        let n = copy_body(&mut reader, &mut writer, HttpBodyType::ContentLength(11), 64)
            .await
            .unwrap();
        assert_eq!(n, 11);
        assert_eq!(writer, b"hello world");

        let mut left = Vec::new();
        reader.read_to_end(&mut left).await.unwrap();
        assert_eq!(left, b"GET /next");
    }

    #[tokio::test]
    async fn content_length_truncated() {
        let stream = tokio_test::io::Builder::new().read(b"short").build();
        let mut reader = BufReader::new(stream);
        let mut writer = Vec::new();
        let r = copy_body(&mut reader, &mut writer, HttpBodyType::ContentLength(11), 64).await;
        assert!(matches!(r, Err(HttpBodyCopyError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn chunked() {
        let body = b"5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\n\r\n";
        let stream = tokio_test::io::Builder::new()
            .read(&body[..7])
            .read(&body[7..])
            .read(b"extra")
            .build();
        let mut reader = BufReader::new(stream);
        let mut writer = Vec::new();
        let n = copy_body(&mut reader, &mut writer, HttpBodyType::ChunkedWithoutTrailer, 64)
            .await
            .unwrap();
        assert_eq!(n, body.len() as u64);
        assert_eq!(writer, body);

        let mut left = Vec::new();
        reader.read_to_end(&mut left).await.unwrap();
        assert_eq!(left, b"extra");
    }

    #[tokio::test]
    async fn chunked_with_trailer() {
        let body = b"3\r\nabc\r\n0\r\nX-Checksum: 1\r\n\r\n";
        let stream = tokio_test::io::Builder::new().read(body).build();
        let mut reader = BufReader::new(stream);
        let mut writer = Vec::new();
        copy_body(&mut reader, &mut writer, HttpBodyType::ChunkedWithTrailer, 64)
            .await
            .unwrap();
        assert_eq!(writer, body);
    }

    #[tokio::test]
    async fn chunked_invalid() {
        let stream = tokio_test::io::Builder::new().read(b"3\r\nabcX\r\n").build();
        let mut reader = BufReader::new(stream);
        let mut writer = Vec::new();
        let r = copy_body(&mut reader, &mut writer, HttpBodyType::ChunkedWithoutTrailer, 64).await;
        assert!(matches!(r, Err(HttpBodyCopyError::InvalidChunkedBody(_))));
    }
}

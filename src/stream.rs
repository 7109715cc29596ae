//! Byte streams flowing from the source and transcoder into response bodies.

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Boxed stream of body chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Wrap an async reader as a [`ByteStream`].
pub fn from_reader<R>(reader: R) -> ByteStream
where
    R: AsyncRead + Send + 'static,
{
    ReaderStream::new(reader).boxed()
}

/// Wait for the first non-empty chunk of `stream`.
///
/// Returns the stream with that chunk put back in front. An error, or the
/// stream ending before any data, is reported here so the caller can still
/// pick the response status. Once this returns `Ok`, later failures can only
/// cut the body short.
pub async fn prime(mut stream: ByteStream) -> io::Result<ByteStream> {
    loop {
        match stream.next().await {
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => {
                return Ok(stream::once(async move { Ok(chunk) })
                    .chain(stream)
                    .boxed())
            }
            Some(Err(e)) => return Err(e),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before producing any data",
                ))
            }
        }
    }
}

use bytes::{Bytes, BytesMut};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use futures::executor::block_on;
use micro_chunked::codec::{ChunkedDecoder, ChunkedEncoder};
use micro_chunked::connection::{BodyReader, EncodeSession};
use micro_chunked::protocol::PayloadItem;
use std::{
    hint::black_box,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

// Mock IO handing out at most `read_size` bytes per read
struct MockIO {
    read_data: Vec<u8>,
    write_data: Vec<u8>,
    read_pos: usize,
    read_size: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>, read_size: usize) -> Self {
        Self { read_data, write_data: Vec::new(), read_pos: 0, read_size }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = remaining.len().min(buf.remaining()).min(self.read_size);
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.write_data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

fn payloads() -> Vec<Bytes> {
    (0..64).map(|i| Bytes::from(vec![b'a' + (i % 26) as u8; 64 + i * 16])).collect()
}

fn encoded_body() -> Vec<u8> {
    let mut encoder = ChunkedEncoder::new();
    let mut dst = BytesMut::new();
    for payload in payloads() {
        encoder.encode(PayloadItem::Chunk(payload), &mut dst).unwrap();
    }
    encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
    dst.to_vec()
}

fn bench_chunked_encoder(c: &mut Criterion) {
    let payloads = payloads();

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(payloads.iter().map(|p| p.len() as u64).sum()));
    group.bench_function("encode_chunks", |b| {
        b.iter(|| {
            let mut encoder = ChunkedEncoder::new();
            let mut dst = BytesMut::new();
            for payload in &payloads {
                encoder.encode(PayloadItem::Chunk(payload.clone()), &mut dst).unwrap();
            }
            encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
            black_box(dst);
        });
    });
    group.finish();
}

fn bench_chunked_decoder(c: &mut Criterion) {
    let body = encoded_body();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(body.len() as u64));

    group.bench_function("decode_at_once", |b| {
        b.iter(|| {
            let mut decoder = ChunkedDecoder::new();
            let mut src = BytesMut::from(&body[..]);
            while let Some(item) = decoder.decode(&mut src).unwrap() {
                black_box(item);
            }
        });
    });

    for slice_size in [1, 17, 1024] {
        group.bench_function(format!("feed_{slice_size}_bytes"), |b| {
            b.iter(|| {
                let mut decoder = ChunkedDecoder::new();
                for slice in body.chunks(slice_size) {
                    for item in decoder.feed(slice) {
                        black_box(item.unwrap());
                    }
                }
                decoder.finish().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_sessions(c: &mut Criterion) {
    let payloads = payloads();
    let body = encoded_body();

    c.bench_function("encode_session", |b| {
        b.iter(|| {
            let mut session = EncodeSession::open(MockIO::new(vec![], 0));
            block_on(async {
                for payload in &payloads {
                    session.emit(payload.clone()).await.unwrap();
                }
                session.close().await.unwrap();
            });
            black_box(session.finish().write_data);
        });
    });

    c.bench_function("body_reader", |b| {
        b.iter(|| {
            let mut reader = BodyReader::new(MockIO::new(body.clone(), 1460));
            black_box(block_on(reader.read_to_end()).unwrap());
        });
    });
}

criterion_group!(benches, bench_chunked_encoder, bench_chunked_decoder, bench_sessions);
criterion_main!(benches);

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2026 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{SocketAddr, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;
#[cfg(unix)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod buf;
#[cfg(test)]
use buf::BufMetricsSink;

mod udp;
use udp::UdpMetricsSink;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix::UnixMetricsSink;

enum MetricsSinkIo {
    #[cfg(test)]
    Buf(BufMetricsSink),
    Udp(UdpMetricsSink),
    #[cfg(unix)]
    Unix(UnixMetricsSink),
}

impl MetricsSinkIo {
    fn send_msg(&self, msg: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(test)]
            MetricsSinkIo::Buf(b) => b.send_msg(msg),
            MetricsSinkIo::Udp(s) => s.send_msg(msg),
            #[cfg(unix)]
            MetricsSinkIo::Unix(s) => s.send_msg(msg),
        }
    }
}

/// Newline separated metric lines waiting to be sent.
///
/// Lines are packed into datagrams no larger than `max_segment_size`, a line
/// that is longer than that on its own is sent in a datagram of its own.
pub(crate) struct StatsdMetricsSink {
    cache_size: usize,
    max_segment_size: usize,
    buf: Vec<u8>,
    io: MetricsSinkIo,
}

impl StatsdMetricsSink {
    #[cfg(test)]
    pub(crate) fn buf_with_capacity(
        packets: Arc<Mutex<Vec<Vec<u8>>>>,
        cache_size: usize,
        max_segment_size: usize,
    ) -> Self {
        StatsdMetricsSink {
            cache_size,
            max_segment_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Buf(BufMetricsSink::new(packets)),
        }
    }

    pub(crate) fn udp_with_capacity(
        addr: SocketAddr,
        socket: UdpSocket,
        cache_size: usize,
        max_segment_size: usize,
    ) -> Self {
        StatsdMetricsSink {
            cache_size,
            max_segment_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Udp(UdpMetricsSink::new(addr, socket)),
        }
    }

    #[cfg(unix)]
    pub(crate) fn unix_with_capacity(
        path: PathBuf,
        socket: UnixDatagram,
        cache_size: usize,
        max_segment_size: usize,
    ) -> Self {
        StatsdMetricsSink {
            cache_size,
            max_segment_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Unix(UnixMetricsSink::new(path, socket)),
        }
    }

    pub(crate) fn emit<F>(&mut self, format: F) -> io::Result<()>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        if !self.buf.is_empty() {
            self.buf.push(b'\n');
        }
        format(&mut self.buf);
        if self.buf.len() >= self.cache_size {
            self.flush()
        } else {
            Ok(())
        }
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let r = self.send_segments();
        self.buf.clear();
        r
    }

    fn send_segments(&self) -> io::Result<()> {
        let mut start = 0;
        while start < self.buf.len() {
            let left = &self.buf[start..];
            let len = segment_len(left, self.max_segment_size);
            self.io.send_msg(&left[..len])?;
            start += len + 1; // skip the line separator
        }
        Ok(())
    }
}

fn segment_len(data: &[u8], max_segment_size: usize) -> usize {
    if data.len() <= max_segment_size {
        return data.len();
    }
    match memchr::memrchr(b'\n', &data[..=max_segment_size]) {
        Some(p) if p > 0 => p,
        _ => memchr::memchr(b'\n', data).unwrap_or(data.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_sink(cache_size: usize, max_segment_size: usize) -> (StatsdMetricsSink, Arc<Mutex<Vec<Vec<u8>>>>) {
        let packets = Arc::new(Mutex::new(Vec::new()));
        let sink = StatsdMetricsSink::buf_with_capacity(packets.clone(), cache_size, max_segment_size);
        (sink, packets)
    }

    #[test]
    fn segment() {
        assert_eq!(segment_len(b"abc", 8), 3);
        assert_eq!(segment_len(b"abc\ndef\nghi", 8), 7);
        assert_eq!(segment_len(b"abc\ndef\nghi", 7), 7);
        assert_eq!(segment_len(b"abcdefghij\nk", 4), 10);
        assert_eq!(segment_len(b"abcdefghij", 4), 10);
    }

    #[test]
    fn flush_split() {
        let (mut sink, packets) = new_sink(1024, 8);
        sink.emit(|b| b.extend_from_slice(b"a:1|g")).unwrap();
        sink.emit(|b| b.extend_from_slice(b"b:2|g")).unwrap();
        sink.emit(|b| b.extend_from_slice(b"c:3|g")).unwrap();
        assert!(packets.lock().unwrap().is_empty());

        sink.flush().unwrap();
        let packets = packets.lock().unwrap();
        assert_eq!(
            packets.as_slice(),
            &[b"a:1|g".to_vec(), b"b:2|g".to_vec(), b"c:3|g".to_vec()]
        );
    }

    #[test]
    fn flush_pack() {
        let (mut sink, packets) = new_sink(1024, 12);
        sink.emit(|b| b.extend_from_slice(b"a:1|g")).unwrap();
        sink.emit(|b| b.extend_from_slice(b"b:2|g")).unwrap();
        sink.emit(|b| b.extend_from_slice(b"c:3|g")).unwrap();
        sink.flush().unwrap();
        let packets = packets.lock().unwrap();
        assert_eq!(
            packets.as_slice(),
            &[b"a:1|g\nb:2|g".to_vec(), b"c:3|g".to_vec()]
        );
    }

    #[test]
    fn cache_overflow() {
        let (mut sink, packets) = new_sink(10, 1024);
        sink.emit(|b| b.extend_from_slice(b"a:1|g")).unwrap();
        assert!(packets.lock().unwrap().is_empty());
        sink.emit(|b| b.extend_from_slice(b"b:2|g")).unwrap();
        assert_eq!(packets.lock().unwrap().len(), 1);
        sink.flush().unwrap();
        assert_eq!(packets.lock().unwrap().len(), 1);
    }
}

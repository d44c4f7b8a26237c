/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug, Eq, PartialEq)]
pub struct LogSnapshot {
    pub io: LogIoSnapshot,
    pub drop: LogDropSnapshot,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct LogIoSnapshot {
    pub total: u64,
    pub passed: u64,
    pub size: u64,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct LogDropSnapshot {
    pub format_failed: u64,
    pub channel_closed: u64,
    pub channel_overflow: u64,
    pub peer_unreachable: u64,
}

/// Counters shared between the log drain and its io thread.
#[derive(Default)]
pub struct LogStats {
    pub io: LogIoStats,
    pub drop: LogDropStats,
}

impl LogStats {
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            io: self.io.snapshot(),
            drop: self.drop.snapshot(),
        }
    }
}

#[derive(Default)]
pub struct LogIoStats {
    total: AtomicU64,
    passed: AtomicU64,
    size: AtomicU64,
}

impl LogIoStats {
    pub fn snapshot(&self) -> LogIoSnapshot {
        LogIoSnapshot {
            total: self.total.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            size: self.size.load(Ordering::Relaxed),
        }
    }

    pub fn add_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_passed(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_size(&self, size: usize) {
        self.size.fetch_add(size as u64, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct LogDropStats {
    format_failed: AtomicU64,
    channel_closed: AtomicU64,
    channel_overflow: AtomicU64,
    peer_unreachable: AtomicU64,
}

impl LogDropStats {
    pub fn snapshot(&self) -> LogDropSnapshot {
        LogDropSnapshot {
            format_failed: self.format_failed.load(Ordering::Relaxed),
            channel_closed: self.channel_closed.load(Ordering::Relaxed),
            channel_overflow: self.channel_overflow.load(Ordering::Relaxed),
            peer_unreachable: self.peer_unreachable.load(Ordering::Relaxed),
        }
    }

    pub fn add_format_failed(&self) {
        self.format_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_channel_closed(&self) {
        self.channel_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_channel_overflow(&self) {
        self.channel_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_peer_unreachable(&self) {
        self.peer_unreachable.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_stats() {
        let stats = LogDropStats::default();
        stats.add_format_failed();
        stats.add_channel_overflow();
        stats.add_channel_overflow();
        assert_eq!(
            stats.snapshot(),
            LogDropSnapshot {
                format_failed: 1,
                channel_closed: 0,
                channel_overflow: 2,
                peer_unreachable: 0
            }
        )
    }

    #[test]
    fn io_stats() {
        let stats = LogIoStats::default();
        stats.add_total();
        stats.add_passed();
        stats.add_size(1024);
        assert_eq!(
            stats.snapshot(),
            LogIoSnapshot {
                total: 1,
                passed: 1,
                size: 1024
            }
        )
    }
}

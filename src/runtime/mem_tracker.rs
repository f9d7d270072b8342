// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::common::logging::warn;

/// RAII reservation of logically accounted bytes against one tracker.
///
/// Growable aggregator state (group arrays, value buffers) holds one of these
/// and grows it as the state grows; dropping the reservation releases every
/// byte it still holds.
#[derive(Debug)]
pub struct MemReservation {
    bytes: i64,
    tracker: Arc<MemTracker>,
}

impl MemReservation {
    pub fn new(tracker: Arc<MemTracker>) -> Self {
        Self { bytes: 0, tracker }
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }

    /// Reserve `additional` bytes, failing when a limit anywhere up the
    /// tracker chain would be exceeded. On failure nothing is consumed.
    pub fn try_grow(&mut self, additional: usize) -> Result<(), String> {
        let additional = i64::try_from(additional).unwrap_or(i64::MAX);
        self.tracker.try_consume(additional)?;
        self.bytes += additional;
        Ok(())
    }

    /// Release everything held. The reservation stays usable afterwards.
    pub fn release_all(&mut self) {
        self.tracker.release(self.bytes);
        self.bytes = 0;
    }
}

impl Drop for MemReservation {
    fn drop(&mut self) {
        self.tracker.release(self.bytes);
    }
}

/// Tracks logical memory usage for a component and its ancestors.
///
/// This is a lightweight accounting utility that only records bytes explicitly
/// reported by the caller. It does NOT reflect real process RSS or allocator
/// statistics.
#[derive(Debug)]
pub struct MemTracker {
    label: String,
    limit: i64,
    parent: Option<Arc<MemTracker>>,
    current: AtomicI64,
    peak: AtomicI64,
    allocated: AtomicI64,
    deallocated: AtomicI64,
    children: Mutex<Vec<Weak<MemTracker>>>,
}

impl MemTracker {
    /// Create a root tracker with no parent and no limit.
    pub fn new_root(label: impl Into<String>) -> Arc<Self> {
        Self::new_root_with_limit(label, -1)
    }

    /// Create a root tracker with a byte limit. Negative means unlimited.
    pub fn new_root_with_limit(label: impl Into<String>, limit: i64) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            limit,
            parent: None,
            current: AtomicI64::new(0),
            peak: AtomicI64::new(0),
            allocated: AtomicI64::new(0),
            deallocated: AtomicI64::new(0),
            children: Mutex::new(Vec::new()),
        })
    }

    /// Create a child tracker with the provided parent.
    pub fn new_child(label: impl Into<String>, parent: &Arc<MemTracker>) -> Arc<Self> {
        let child = Arc::new(Self {
            label: label.into(),
            limit: -1,
            parent: Some(Arc::clone(parent)),
            current: AtomicI64::new(0),
            peak: AtomicI64::new(0),
            allocated: AtomicI64::new(0),
            deallocated: AtomicI64::new(0),
            children: Mutex::new(Vec::new()),
        });
        parent
            .children
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::downgrade(&child));
        child
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn current(&self) -> i64 {
        self.current.load(Ordering::Relaxed)
    }

    pub fn peak(&self) -> i64 {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn allocated(&self) -> i64 {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn deallocated(&self) -> i64 {
        self.deallocated.load(Ordering::Relaxed)
    }

    pub fn children(&self) -> Vec<Arc<MemTracker>> {
        let mut out = Vec::new();
        let guard = self.children.lock().unwrap_or_else(|e| e.into_inner());
        for weak in guard.iter() {
            if let Some(child) = weak.upgrade() {
                out.push(child);
            }
        }
        out
    }

    /// Increase consumption for this tracker and all ancestors.
    pub fn consume(&self, bytes: i64) {
        if bytes <= 0 {
            return;
        }
        let mut tracker: Option<&MemTracker> = Some(self);
        while let Some(current) = tracker {
            let new_value = current.current.fetch_add(bytes, Ordering::AcqRel) + bytes;
            current.allocated.fetch_add(bytes, Ordering::AcqRel);
            current.update_peak(new_value);
            tracker = current.parent.as_deref();
        }
    }

    /// Increase consumption, honoring limits on this tracker and all
    /// ancestors. On breach nothing stays consumed and a descriptive error
    /// is returned.
    pub fn try_consume(&self, bytes: i64) -> Result<(), String> {
        if bytes <= 0 {
            return Ok(());
        }
        let mut chain: Vec<&MemTracker> = Vec::new();
        let mut node: Option<&MemTracker> = Some(self);
        while let Some(current) = node {
            chain.push(current);
            node = current.parent.as_deref();
        }
        for (idx, current) in chain.iter().enumerate() {
            let new_value = current.current.fetch_add(bytes, Ordering::AcqRel) + bytes;
            if current.limit >= 0 && new_value > current.limit {
                for applied in &chain[..=idx] {
                    applied.current.fetch_sub(bytes, Ordering::AcqRel);
                }
                warn!(
                    "memory limit exceeded on tracker {}: requested {} bytes, used {}, limit {}",
                    current.label,
                    bytes,
                    new_value - bytes,
                    current.limit
                );
                return Err(format!(
                    "memory limit exceeded: tracker {} requested {} bytes with {} already used (limit {})",
                    current.label,
                    bytes,
                    new_value - bytes,
                    current.limit
                ));
            }
        }
        for current in &chain {
            current.allocated.fetch_add(bytes, Ordering::AcqRel);
            current.update_peak(current.current.load(Ordering::Relaxed));
        }
        Ok(())
    }

    /// Decrease consumption for this tracker and all ancestors.
    pub fn release(&self, bytes: i64) {
        if bytes <= 0 {
            return;
        }
        let mut tracker: Option<&MemTracker> = Some(self);
        while let Some(current) = tracker {
            current.current.fetch_sub(bytes, Ordering::AcqRel);
            current.deallocated.fetch_add(bytes, Ordering::AcqRel);
            tracker = current.parent.as_deref();
        }
    }

    fn update_peak(&self, value: i64) {
        let mut prev = self.peak.load(Ordering::Relaxed);
        while value > prev {
            match self
                .peak
                .compare_exchange(prev, value, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => prev = actual,
            }
        }
    }
}

static PROCESS_TRACKER: OnceLock<Arc<MemTracker>> = OnceLock::new();

/// Global process-level logical memory tracker.
///
/// The limit comes from `[compute] mem_limit_bytes` when a config file is
/// loaded; otherwise unlimited.
pub fn process_mem_tracker() -> Arc<MemTracker> {
    Arc::clone(PROCESS_TRACKER.get_or_init(|| {
        MemTracker::new_root_with_limit("process", crate::common::config::compute_mem_limit_bytes())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_rolls_up_to_parent() {
        let root = MemTracker::new_root("root");
        let child = MemTracker::new_child("child", &root);
        child.consume(128);
        assert_eq!(child.current(), 128);
        assert_eq!(root.current(), 128);
        child.release(128);
        assert_eq!(child.current(), 0);
        assert_eq!(root.current(), 0);
        assert_eq!(root.peak(), 128);
    }

    #[test]
    fn test_try_consume_enforces_ancestor_limit() {
        let root = MemTracker::new_root_with_limit("root", 100);
        let child = MemTracker::new_child("child", &root);
        child.try_consume(60).expect("within limit");
        let err = child.try_consume(60).expect_err("limit breached");
        assert!(err.contains("memory limit exceeded"), "got: {err}");
        assert!(err.contains("root"), "got: {err}");
        // The failed request must leave nothing behind.
        assert_eq!(child.current(), 60);
        assert_eq!(root.current(), 60);
    }

    #[test]
    fn test_reservation_releases_on_drop() {
        let root = MemTracker::new_root("root");
        {
            let mut reservation = MemReservation::new(Arc::clone(&root));
            reservation.try_grow(64).expect("no limit");
            reservation.try_grow(32).expect("no limit");
            assert_eq!(reservation.bytes(), 96);
            assert_eq!(root.current(), 96);
        }
        assert_eq!(root.current(), 0);
        assert_eq!(root.allocated(), 96);
        assert_eq!(root.deallocated(), 96);
    }
}

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
use std::sync::Arc;

use crate::common::logging::debug;
use crate::runtime::mem_tracker::{self, MemReservation, MemTracker};

/// Per-pipeline-task execution context handed to aggregator construction and
/// evaluation.
///
/// Today it carries memory accounting; more execution-time parameters can
/// migrate here over time. One context belongs to one single-threaded task;
/// cloning shares the underlying tracker.
#[derive(Debug, Clone)]
pub struct ExecContext {
    mem_tracker: Arc<MemTracker>,
}

impl ExecContext {
    pub fn new(mem_tracker: Arc<MemTracker>) -> Self {
        Self { mem_tracker }
    }

    /// Context for one named task, tracked as a child of the process tracker.
    pub fn for_task(label: impl Into<String>) -> Self {
        let tracker = MemTracker::new_child(label, &mem_tracker::process_mem_tracker());
        debug!("created exec context for task {}", tracker.label());
        Self {
            mem_tracker: tracker,
        }
    }

    pub fn mem_tracker(&self) -> &Arc<MemTracker> {
        &self.mem_tracker
    }

    /// Fresh empty reservation against this task's tracker.
    pub fn reservation(&self) -> MemReservation {
        MemReservation::new(Arc::clone(&self.mem_tracker))
    }
}

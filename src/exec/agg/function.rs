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
use std::fmt;

use crate::exec::block::{BlockImpl, ElementType, IntBlock, Mask};
use crate::exec::page::Page;
use crate::runtime::exec_ctx::ExecContext;

/// One column of an aggregate's intermediate state: its name and element
/// type, in wire order. The partial phase emits exactly this shape and the
/// final phase consumes exactly this shape, so the list is the cross-node
/// contract for an aggregate kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntermediateStateDesc {
    name: &'static str,
    element_type: ElementType,
}

impl IntermediateStateDesc {
    pub const fn new(name: &'static str, element_type: ElementType) -> Self {
        Self { name, element_type }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
}

/// Ungrouped aggregate over whole pages.
///
/// An instance moves through three phases: collecting (`add_raw_input` /
/// `add_intermediate_input`, any number of times, in any mix), evaluation
/// (`evaluate_intermediate` / `evaluate_final`, repeatable, state is not
/// consumed), and closed (`close`, after which input is rejected).
///
/// Instances are single-threaded; parallelism is across instances, stitched
/// together by shipping intermediate pages between them.
pub trait AggregatorFunction: Send + fmt::Display {
    fn intermediate_state_desc(&self) -> &[IntermediateStateDesc];

    fn intermediate_block_count(&self) -> usize {
        self.intermediate_state_desc().len()
    }

    /// Folds the selected rows of the input channel(s) into local state.
    /// A masked-out row is excluded whole, every value of a selected
    /// multi-valued row is folded individually, and null rows contribute
    /// nothing.
    fn add_raw_input(&mut self, page: &Page, mask: &Mask) -> Result<(), String>;

    /// Merges one partial result emitted by `evaluate_intermediate` on a
    /// sibling instance. The page must carry the channels described by
    /// [`Self::intermediate_state_desc`] with exactly one position; a page
    /// whose state channels are entirely null is a no-op instead.
    fn add_intermediate_input(&mut self, page: &Page) -> Result<(), String>;

    /// Writes `intermediate_block_count()` single-position blocks into
    /// `blocks[offset..]` for shipping to a merging instance.
    fn evaluate_intermediate(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        ctx: &ExecContext,
    ) -> Result<(), String>;

    /// Writes the single-position result block into `blocks[offset]`. With
    /// no rows aggregated this yields the aggregate's identity, never an
    /// error.
    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        ctx: &ExecContext,
    ) -> Result<(), String>;

    /// Releases accumulated state. Idempotent and safe on a never-fed
    /// instance; any later input or evaluation is rejected with an error.
    fn close(&mut self);
}

/// Grouped aggregate: the same protocol with a group-ordinal column on every
/// input and one output row per group ordinal on evaluation.
///
/// The ordinal column pairs row p of the page with group `ordinals[p]`.
/// State is kept densely indexed by ordinal and grows on first sight of a
/// larger ordinal, so sparse and repeated arrival are both fine. Evaluation
/// emits ordinals `0..n` in order, where n is one past the largest ordinal
/// seen.
pub trait GroupingAggregatorFunction: Send + fmt::Display {
    fn intermediate_state_desc(&self) -> &[IntermediateStateDesc];

    fn intermediate_block_count(&self) -> usize {
        self.intermediate_state_desc().len()
    }

    /// The ordinal column must be a dense non-null single-valued vector of
    /// non-negative ints with the page's position count; anything else is an
    /// invalid-shape error.
    fn add_raw_input(
        &mut self,
        ordinals: &IntBlock,
        page: &Page,
        mask: &Mask,
    ) -> Result<(), String>;

    /// Merges grouped partial results: position p of every state channel
    /// belongs to group `ordinals[p]`.
    fn add_intermediate_input(&mut self, ordinals: &IntBlock, page: &Page) -> Result<(), String>;

    /// Writes state channels with one position per known group ordinal.
    fn evaluate_intermediate(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        ctx: &ExecContext,
    ) -> Result<(), String>;

    /// Writes the result block with one position per known group ordinal.
    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        ctx: &ExecContext,
    ) -> Result<(), String>;

    fn close(&mut self);
}

/// Stateless factory for one configured aggregate: a kind plus the input
/// channel list, reusable across pipeline tasks. `aggregator` and
/// `grouping_aggregator` hand out fresh instances with fresh state.
pub trait AggregatorFunctionSupplier: Send + Sync {
    fn aggregator(&self, ctx: &ExecContext) -> Box<dyn AggregatorFunction>;

    fn grouping_aggregator(&self, ctx: &ExecContext) -> Box<dyn GroupingAggregatorFunction>;

    /// Stable human-readable name, e.g. `"sum of longs"`.
    fn describe(&self) -> String;
}

impl fmt::Debug for dyn AggregatorFunctionSupplier + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

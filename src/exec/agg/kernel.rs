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
use std::marker::PhantomData;
use std::slice;

use crate::exec::block::{Block, BlockImpl, BlockShape, Element, IntBlock, Mask, Vector};
use crate::exec::page::Page;
use crate::runtime::exec_ctx::ExecContext;

use super::function::{
    AggregatorFunction, AggregatorFunctionSupplier, GroupingAggregatorFunction,
    IntermediateStateDesc,
};
use super::state::GroupStates;

/// The type/state/combine bundle of one aggregate kind over one element
/// type. One implementation, monomorphized per element type, serves the
/// ungrouped and grouping drivers alike; a kernel itself is a stateless tag
/// and is never instantiated.
pub trait AggregateKernel: Send + Sync + 'static {
    /// Raw input element type.
    type Input: Element;
    /// Per-group accumulator.
    type State: Send + 'static;
    /// Borrowed, already-downcast view over the intermediate state columns,
    /// built once per page and then indexed row by row while merging.
    type MergeView<'a>;

    const NAME: &'static str;

    /// Wire shape of the intermediate state, in channel order.
    fn intermediate_state() -> Vec<IntermediateStateDesc>;

    fn describe() -> String {
        format!(
            "{} of {}",
            Self::NAME,
            Self::Input::ELEMENT_TYPE.plural_name()
        )
    }

    fn init_state(ctx: &ExecContext) -> Self::State;

    /// Folds one raw input value into the accumulator.
    fn combine(state: &mut Self::State, value: &Self::Input) -> Result<(), String>;

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String>;

    /// Merges position `position` of a partial result into the accumulator.
    fn merge_row(
        state: &mut Self::State,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String>;

    /// One block per intermediate state column, one position per state.
    fn evaluate_intermediate(states: &[Self::State]) -> Vec<BlockImpl>;

    /// One position per state; a state that never saw a value yields the
    /// aggregate's identity.
    fn evaluate_final(states: &[Self::State]) -> BlockImpl;
}

/// Runs the per-value fold over every selected, non-null value of `block`.
/// The closure receives the position so grouped callers can key their state;
/// masking is per row, so all values of a masked-out row are skipped
/// together.
pub(super) fn fold_values<E: Element>(
    block: &Block<E>,
    mask: &Mask,
    mut f: impl FnMut(usize, &E) -> Result<(), String>,
) -> Result<(), String> {
    match block.shape() {
        BlockShape::Dense(vector) => {
            if mask.all_true() {
                for (position, value) in vector.values().iter().enumerate() {
                    f(position, value)?;
                }
            } else {
                for (position, value) in vector.values().iter().enumerate() {
                    if !mask.selected(position) {
                        continue;
                    }
                    f(position, value)?;
                }
            }
        }
        BlockShape::General(rows) => {
            if mask.all_true() {
                for position in 0..rows.position_count() {
                    if rows.is_null(position) {
                        continue;
                    }
                    let first = rows.first_value_index(position);
                    for index in first..first + rows.value_count(position) {
                        f(position, rows.value(index))?;
                    }
                }
            } else {
                for position in 0..rows.position_count() {
                    if !mask.selected(position) {
                        continue;
                    }
                    if rows.is_null(position) {
                        continue;
                    }
                    let first = rows.first_value_index(position);
                    for index in first..first + rows.value_count(position) {
                        f(position, rows.value(index))?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Downcasts intermediate state column `index` to a dense vector of `E`.
/// State columns carry presence in a dedicated `seen` column, so anything
/// block-shaped here is a wire bug.
pub(super) fn intermediate_vector<'a, E: Element>(
    blocks: &[&'a BlockImpl],
    index: usize,
    name: &str,
) -> Result<&'a Vector<E>, String> {
    let block = blocks
        .get(index)
        .ok_or_else(|| format!("missing intermediate column {name}"))?;
    let typed = block.typed::<E>().ok_or_else(|| {
        format!(
            "intermediate column {name} expected {} values, got {}",
            E::ELEMENT_TYPE,
            block.element_type()
        )
    })?;
    typed
        .as_vector()
        .ok_or_else(|| format!("intermediate column {name} must be a dense vector"))
}

pub(super) fn function_label(describe: String, channels: &[usize]) -> String {
    format!("{describe}[channels={channels:?}]")
}

pub(super) fn closed_error(label: &str) -> String {
    format!("{label} has been closed")
}

pub(super) fn check_mask(label: &str, page: &Page, mask: &Mask) -> Result<(), String> {
    if mask.position_count() != page.position_count() {
        return Err(format!(
            "{} got a mask of {} positions for a page of {}",
            label,
            mask.position_count(),
            page.position_count()
        ));
    }
    Ok(())
}

/// Fetches the raw input column, typed. `None` means the column is entirely
/// null and the whole call is a no-op; that is decided before the downcast
/// so a constant-null column never reads as a type mismatch.
pub(super) fn raw_input_block<'a, E: Element>(
    label: &str,
    page: &'a Page,
    channel: usize,
) -> Result<Option<&'a Block<E>>, String> {
    let block = page.try_block(channel)?;
    if block.are_all_values_null() {
        return Ok(None);
    }
    match block.typed::<E>() {
        Some(typed) => Ok(Some(typed)),
        None => Err(format!(
            "{} expected {} input at channel {}, got {}",
            label,
            E::ELEMENT_TYPE,
            channel,
            block.element_type()
        )),
    }
}

/// Fetches the intermediate state columns. `None` means some state column is
/// entirely null, which stands for a partial that saw no input; the merge is
/// then a no-op.
pub(super) fn intermediate_blocks<'a>(
    label: &str,
    desc_len: usize,
    channels: &[usize],
    page: &'a Page,
) -> Result<Option<Vec<&'a BlockImpl>>, String> {
    if channels.len() != desc_len {
        return Err(format!(
            "{} is wired to {} channels; intermediate input needs {}",
            label,
            channels.len(),
            desc_len
        ));
    }
    let mut blocks = Vec::with_capacity(channels.len());
    for &channel in channels {
        blocks.push(page.try_block(channel)?);
    }
    if blocks.iter().any(|block| block.are_all_values_null()) {
        return Ok(None);
    }
    Ok(Some(blocks))
}

/// Decodes and validates the group ordinal column: it must be a dense
/// non-null single-valued vector matching the page's position count.
pub(super) fn ordinal_vector<'a>(
    label: &str,
    ordinals: &'a IntBlock,
    page: &Page,
) -> Result<&'a Vector<i32>, String> {
    let vector = ordinals
        .as_vector()
        .ok_or_else(|| format!("{label} requires group ordinals in a dense non-null vector"))?;
    if vector.position_count() != page.position_count() {
        return Err(format!(
            "{} got {} group ordinals for a page of {} positions",
            label,
            vector.position_count(),
            page.position_count()
        ));
    }
    Ok(vector)
}

pub(super) fn ordinal_index(label: &str, ordinal: i32) -> Result<usize, String> {
    usize::try_from(ordinal).map_err(|_| format!("{label} got negative group ordinal {ordinal}"))
}

pub(super) fn write_blocks(
    label: &str,
    blocks: &mut [Option<BlockImpl>],
    offset: usize,
    out: Vec<BlockImpl>,
) -> Result<(), String> {
    if blocks.len().saturating_sub(offset) < out.len() {
        return Err(format!(
            "{} needs {} output slots at offset {}, the output row has {}",
            label,
            out.len(),
            offset,
            blocks.len()
        ));
    }
    for (slot, block) in blocks[offset..].iter_mut().zip(out) {
        *slot = Some(block);
    }
    Ok(())
}

/// Ungrouped driver adapting a kernel to [`AggregatorFunction`]: one
/// accumulator, fed until evaluation, released on close.
pub struct KernelAggregatorFunction<K: AggregateKernel> {
    channels: Vec<usize>,
    label: String,
    desc: Vec<IntermediateStateDesc>,
    state: Option<K::State>,
}

impl<K: AggregateKernel> KernelAggregatorFunction<K> {
    pub(super) fn new(channels: Vec<usize>, ctx: &ExecContext) -> Self {
        Self {
            label: function_label(K::describe(), &channels),
            desc: K::intermediate_state(),
            state: Some(K::init_state(ctx)),
            channels,
        }
    }

    fn state(&self) -> Result<&K::State, String> {
        self.state.as_ref().ok_or_else(|| closed_error(&self.label))
    }
}

impl<K: AggregateKernel> AggregatorFunction for KernelAggregatorFunction<K> {
    fn intermediate_state_desc(&self) -> &[IntermediateStateDesc] {
        &self.desc
    }

    fn add_raw_input(&mut self, page: &Page, mask: &Mask) -> Result<(), String> {
        let label = &self.label;
        let state = self.state.as_mut().ok_or_else(|| closed_error(label))?;
        check_mask(label, page, mask)?;
        if mask.all_false() {
            return Ok(());
        }
        let Some(block) = raw_input_block::<K::Input>(label, page, self.channels[0])? else {
            return Ok(());
        };
        fold_values(block, mask, |_, value| K::combine(state, value))
    }

    fn add_intermediate_input(&mut self, page: &Page) -> Result<(), String> {
        let label = &self.label;
        let state = self.state.as_mut().ok_or_else(|| closed_error(label))?;
        let Some(blocks) = intermediate_blocks(label, self.desc.len(), &self.channels, page)?
        else {
            return Ok(());
        };
        if page.position_count() != 1 {
            return Err(format!(
                "{} expected an intermediate page with exactly one position, got {}",
                label,
                page.position_count()
            ));
        }
        let view = K::build_merge_view(&blocks)?;
        K::merge_row(state, &view, 0)
    }

    fn evaluate_intermediate(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let state = self.state()?;
        let out = K::evaluate_intermediate(slice::from_ref(state));
        write_blocks(&self.label, blocks, offset, out)
    }

    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let state = self.state()?;
        let out = vec![K::evaluate_final(slice::from_ref(state))];
        write_blocks(&self.label, blocks, offset, out)
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl<K: AggregateKernel> fmt::Display for KernelAggregatorFunction<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Grouping driver adapting a kernel to [`GroupingAggregatorFunction`]: a
/// dense ordinal-indexed state array fed by the same per-value fold as the
/// ungrouped driver.
pub struct GroupingKernelAggregatorFunction<K: AggregateKernel> {
    channels: Vec<usize>,
    label: String,
    desc: Vec<IntermediateStateDesc>,
    states: Option<GroupStates<K::State>>,
}

impl<K: AggregateKernel> GroupingKernelAggregatorFunction<K> {
    pub(super) fn new(channels: Vec<usize>, ctx: &ExecContext) -> Self {
        Self {
            label: function_label(K::describe(), &channels),
            desc: K::intermediate_state(),
            states: Some(GroupStates::new(ctx)),
            channels,
        }
    }

    fn states(&self) -> Result<&GroupStates<K::State>, String> {
        self.states
            .as_ref()
            .ok_or_else(|| closed_error(&self.label))
    }
}

impl<K: AggregateKernel> GroupingAggregatorFunction for GroupingKernelAggregatorFunction<K> {
    fn intermediate_state_desc(&self) -> &[IntermediateStateDesc] {
        &self.desc
    }

    fn add_raw_input(
        &mut self,
        ordinals: &IntBlock,
        page: &Page,
        mask: &Mask,
    ) -> Result<(), String> {
        let label = &self.label;
        let states = self.states.as_mut().ok_or_else(|| closed_error(label))?;
        check_mask(label, page, mask)?;
        let ordinals = ordinal_vector(label, ordinals, page)?;
        if mask.all_false() {
            return Ok(());
        }
        let Some(block) = raw_input_block::<K::Input>(label, page, self.channels[0])? else {
            return Ok(());
        };
        let ordinals = ordinals.values();
        fold_values(block, mask, |position, value| {
            let index = ordinal_index(label, ordinals[position])?;
            states.grow_to(index + 1, K::init_state)?;
            K::combine(states.get_mut(index), value)
        })
    }

    fn add_intermediate_input(&mut self, ordinals: &IntBlock, page: &Page) -> Result<(), String> {
        let label = &self.label;
        let states = self.states.as_mut().ok_or_else(|| closed_error(label))?;
        let ordinals = ordinal_vector(label, ordinals, page)?;
        let Some(blocks) = intermediate_blocks(label, self.desc.len(), &self.channels, page)?
        else {
            return Ok(());
        };
        let view = K::build_merge_view(&blocks)?;
        for (position, &ordinal) in ordinals.values().iter().enumerate() {
            let index = ordinal_index(label, ordinal)?;
            states.grow_to(index + 1, K::init_state)?;
            K::merge_row(states.get_mut(index), &view, position)?;
        }
        Ok(())
    }

    fn evaluate_intermediate(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let states = self.states()?;
        let out = K::evaluate_intermediate(states.as_slice());
        write_blocks(&self.label, blocks, offset, out)
    }

    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let states = self.states()?;
        let out = vec![K::evaluate_final(states.as_slice())];
        write_blocks(&self.label, blocks, offset, out)
    }

    fn close(&mut self) {
        self.states = None;
    }
}

impl<K: AggregateKernel> fmt::Display for GroupingKernelAggregatorFunction<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Supplier for kernel-driven aggregates. `channels` is either the single
/// raw input channel or one channel per intermediate state column, depending
/// on which side of the exchange the aggregate sits.
pub struct KernelSupplier<K: AggregateKernel> {
    channels: Vec<usize>,
    _kernel: PhantomData<K>,
}

impl<K: AggregateKernel> KernelSupplier<K> {
    pub fn try_new(channels: Vec<usize>) -> Result<Self, String> {
        let desc_len = K::intermediate_state().len();
        if channels.len() != 1 && channels.len() != desc_len {
            return Err(format!(
                "{} takes 1 raw channel or {} intermediate channels, got {}",
                K::describe(),
                desc_len,
                channels.len()
            ));
        }
        Ok(Self {
            channels,
            _kernel: PhantomData,
        })
    }
}

impl<K: AggregateKernel> AggregatorFunctionSupplier for KernelSupplier<K> {
    fn aggregator(&self, ctx: &ExecContext) -> Box<dyn AggregatorFunction> {
        Box::new(KernelAggregatorFunction::<K>::new(
            self.channels.clone(),
            ctx,
        ))
    }

    fn grouping_aggregator(&self, ctx: &ExecContext) -> Box<dyn GroupingAggregatorFunction> {
        Box::new(GroupingKernelAggregatorFunction::<K>::new(
            self.channels.clone(),
            ctx,
        ))
    }

    fn describe(&self) -> String {
        K::describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_label_format() {
        assert_eq!(
            function_label("sum of longs".to_string(), &[0]),
            "sum of longs[channels=[0]]"
        );
        assert_eq!(
            function_label("last_over_time of doubles".to_string(), &[1, 0]),
            "last_over_time of doubles[channels=[1, 0]]"
        );
    }

    #[test]
    fn test_write_blocks_rejects_short_output() {
        let mut blocks = vec![None; 2];
        let out = vec![BlockImpl::constant_null(1), BlockImpl::constant_null(1)];
        let err = write_blocks("count[channels=[0]]", &mut blocks, 1, out)
            .expect_err("expected slot error");
        assert!(err.contains("needs 2 output slots at offset 1"), "got: {err}");
        assert!(blocks[0].is_none());
    }

    #[test]
    fn test_write_blocks_fills_at_offset() {
        let mut blocks = vec![None; 3];
        write_blocks(
            "count[channels=[0]]",
            &mut blocks,
            1,
            vec![BlockImpl::constant_null(4)],
        )
        .expect("fits");
        assert!(blocks[0].is_none());
        assert_eq!(blocks[1].as_ref().map(|b| b.position_count()), Some(4));
        assert!(blocks[2].is_none());
    }
}

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

//! Time-series aggregate keeping, per group, the value observed at the
//! largest timestamp.
//!
//! Unlike the kernel-driven aggregates this one reads two raw channels, a
//! value column and a timestamp column, so it implements the aggregator
//! protocol directly instead of going through the generic drivers. Raw
//! input reads `[values, timestamps]`; intermediate input reads the state
//! columns in wire order `[timestamps, values]`. The raw timestamp column
//! must be a dense vector; presence in the intermediate state is carried by
//! nullness of the value column, not by a `seen` column.

use std::fmt;
use std::marker::PhantomData;
use std::slice;

use crate::exec::agg::function::{
    AggregatorFunction, AggregatorFunctionSupplier, GroupingAggregatorFunction,
    IntermediateStateDesc,
};
use crate::exec::agg::kernel::{
    check_mask, closed_error, fold_values, function_label, intermediate_blocks,
    intermediate_vector, ordinal_index, ordinal_vector, raw_input_block, write_blocks,
};
use crate::exec::agg::state::{GroupStates, LastOverTimeState};
use crate::exec::block::{
    Block, BlockBuilder, BlockImpl, Element, ElementType, IntBlock, Mask, Vector,
};
use crate::exec::page::Page;
use crate::runtime::exec_ctx::ExecContext;

pub struct LastOverTimeSupplier<E> {
    channels: Vec<usize>,
    _element: PhantomData<E>,
}

impl<E: Element> LastOverTimeSupplier<E> {
    pub fn try_new(channels: Vec<usize>) -> Result<Self, String> {
        if channels.len() != 2 {
            return Err(format!(
                "{} takes a value channel and a timestamp channel, got {} channels",
                describe::<E>(),
                channels.len()
            ));
        }
        Ok(Self {
            channels,
            _element: PhantomData,
        })
    }
}

impl<E: Element> AggregatorFunctionSupplier for LastOverTimeSupplier<E> {
    fn aggregator(&self, ctx: &ExecContext) -> Box<dyn AggregatorFunction> {
        Box::new(LastOverTimeFunction::<E>::new(self.channels.clone(), ctx))
    }

    fn grouping_aggregator(&self, ctx: &ExecContext) -> Box<dyn GroupingAggregatorFunction> {
        Box::new(GroupingLastOverTimeFunction::<E>::new(
            self.channels.clone(),
            ctx,
        ))
    }

    fn describe(&self) -> String {
        describe::<E>()
    }
}

fn describe<E: Element>() -> String {
    format!("last_over_time of {}", E::ELEMENT_TYPE.plural_name())
}

fn intermediate_state<E: Element>() -> Vec<IntermediateStateDesc> {
    vec![
        IntermediateStateDesc::new("timestamps", ElementType::Long),
        IntermediateStateDesc::new("values", E::ELEMENT_TYPE),
    ]
}

fn timestamp_vector<'a>(
    label: &str,
    page: &'a Page,
    channel: usize,
) -> Result<&'a Vector<i64>, String> {
    let block = page.try_block(channel)?;
    let typed = block.typed::<i64>().ok_or_else(|| {
        format!(
            "{} expected long timestamps at channel {}, got {}",
            label,
            channel,
            block.element_type()
        )
    })?;
    typed.as_vector().ok_or_else(|| {
        format!(
            "{} requires a dense timestamp vector at channel {}",
            label, channel
        )
    })
}

fn merge_view<'a, E: Element>(
    blocks: &[&'a BlockImpl],
) -> Result<(&'a Vector<i64>, &'a Block<E>), String> {
    let timestamps = intermediate_vector::<i64>(blocks, 0, "timestamps")?;
    let values = blocks
        .get(1)
        .ok_or_else(|| "missing intermediate column values".to_string())?;
    let values = values.typed::<E>().ok_or_else(|| {
        format!(
            "intermediate column values expected {} values, got {}",
            E::ELEMENT_TYPE,
            values.element_type()
        )
    })?;
    Ok((timestamps, values))
}

fn merge_position<E: Element>(
    state: &mut LastOverTimeState<E>,
    timestamps: &Vector<i64>,
    values: &Block<E>,
    position: usize,
) {
    if values.is_null(position) {
        return;
    }
    let value = values.value(values.first_value_index(position));
    state.collect(*timestamps.get(position), value);
}

fn intermediate_output<E: Element>(states: &[LastOverTimeState<E>]) -> Vec<BlockImpl> {
    let timestamps: Vec<i64> = states.iter().map(|state| state.timestamp).collect();
    let mut values = BlockBuilder::<E>::with_capacity(states.len());
    for state in states {
        match &state.value {
            Some(value) => values.append(value.clone()),
            None => values.append_null(),
        }
    }
    vec![
        BlockImpl::from(Vector::new(timestamps)),
        BlockImpl::from(values.build()),
    ]
}

fn final_output<E: Element>(states: &[LastOverTimeState<E>]) -> BlockImpl {
    let mut builder = BlockBuilder::<E>::with_capacity(states.len());
    for state in states {
        match &state.value {
            Some(value) => builder.append(value.clone()),
            None => builder.append_null(),
        }
    }
    BlockImpl::from(builder.build())
}

pub struct LastOverTimeFunction<E: Element> {
    channels: Vec<usize>,
    label: String,
    desc: Vec<IntermediateStateDesc>,
    state: Option<LastOverTimeState<E>>,
}

impl<E: Element> LastOverTimeFunction<E> {
    fn new(channels: Vec<usize>, _ctx: &ExecContext) -> Self {
        Self {
            label: function_label(describe::<E>(), &channels),
            desc: intermediate_state::<E>(),
            state: Some(LastOverTimeState::default()),
            channels,
        }
    }

    fn state(&self) -> Result<&LastOverTimeState<E>, String> {
        self.state.as_ref().ok_or_else(|| closed_error(&self.label))
    }
}

impl<E: Element> AggregatorFunction for LastOverTimeFunction<E> {
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
        let Some(values) = raw_input_block::<E>(label, page, self.channels[0])? else {
            return Ok(());
        };
        let timestamps = timestamp_vector(label, page, self.channels[1])?;
        fold_values(values, mask, |position, value| {
            state.collect(*timestamps.get(position), value);
            Ok(())
        })
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
        let (timestamps, values) = merge_view::<E>(&blocks)?;
        merge_position(state, timestamps, values, 0);
        Ok(())
    }

    fn evaluate_intermediate(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let state = self.state()?;
        let out = intermediate_output(slice::from_ref(state));
        write_blocks(&self.label, blocks, offset, out)
    }

    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let state = self.state()?;
        let out = vec![final_output(slice::from_ref(state))];
        write_blocks(&self.label, blocks, offset, out)
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl<E: Element> fmt::Display for LastOverTimeFunction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

pub struct GroupingLastOverTimeFunction<E: Element> {
    channels: Vec<usize>,
    label: String,
    desc: Vec<IntermediateStateDesc>,
    states: Option<GroupStates<LastOverTimeState<E>>>,
}

impl<E: Element> GroupingLastOverTimeFunction<E> {
    fn new(channels: Vec<usize>, ctx: &ExecContext) -> Self {
        Self {
            label: function_label(describe::<E>(), &channels),
            desc: intermediate_state::<E>(),
            states: Some(GroupStates::new(ctx)),
            channels,
        }
    }

    fn states(&self) -> Result<&GroupStates<LastOverTimeState<E>>, String> {
        self.states
            .as_ref()
            .ok_or_else(|| closed_error(&self.label))
    }
}

impl<E: Element> GroupingAggregatorFunction for GroupingLastOverTimeFunction<E> {
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
        let Some(values) = raw_input_block::<E>(label, page, self.channels[0])? else {
            return Ok(());
        };
        let timestamps = timestamp_vector(label, page, self.channels[1])?;
        let ordinals = ordinals.values();
        fold_values(values, mask, |position, value| {
            let index = ordinal_index(label, ordinals[position])?;
            states.grow_to(index + 1, |_| LastOverTimeState::default())?;
            states
                .get_mut(index)
                .collect(*timestamps.get(position), value);
            Ok(())
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
        let (timestamps, values) = merge_view::<E>(&blocks)?;
        for (position, &ordinal) in ordinals.values().iter().enumerate() {
            let index = ordinal_index(label, ordinal)?;
            states.grow_to(index + 1, |_| LastOverTimeState::default())?;
            merge_position(states.get_mut(index), timestamps, values, position);
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
        let out = intermediate_output(states.as_slice());
        write_blocks(&self.label, blocks, offset, out)
    }

    fn evaluate_final(
        &self,
        blocks: &mut [Option<BlockImpl>],
        offset: usize,
        _ctx: &ExecContext,
    ) -> Result<(), String> {
        let states = self.states()?;
        let out = vec![final_output(states.as_slice())];
        write_blocks(&self.label, blocks, offset, out)
    }

    fn close(&mut self) {
        self.states = None;
    }
}

impl<E: Element> fmt::Display for GroupingLastOverTimeFunction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

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
use std::marker::PhantomData;

use crate::exec::agg::function::IntermediateStateDesc;
use crate::exec::agg::kernel::AggregateKernel;
use crate::exec::agg::state::ValuesState;
use crate::exec::block::{Block, BlockBuilder, BlockImpl, Element};
use crate::runtime::exec_ctx::ExecContext;

/// Collects every present value of a group, in arrival order, without
/// deduplication. The only aggregate whose state columns are themselves
/// multi-valued: one position carries a group's whole collection, or null
/// when the group saw nothing.
pub struct ValuesKernel<E>(PhantomData<E>);

fn values_block<E: Element>(states: &[ValuesState<E>]) -> BlockImpl {
    if states.iter().all(|state| state.is_empty()) {
        return BlockImpl::constant_null(states.len());
    }
    let mut builder = BlockBuilder::<E>::with_capacity(states.len());
    for state in states {
        match state.values() {
            [] => builder.append_null(),
            [value] => builder.append(value.clone()),
            values => {
                builder.begin_position_entry();
                for value in values {
                    builder.append(value.clone());
                }
                builder.end_position_entry();
            }
        }
    }
    BlockImpl::from(builder.build())
}

impl<E: Element> AggregateKernel for ValuesKernel<E> {
    type Input = E;
    type State = ValuesState<E>;
    type MergeView<'a> = &'a Block<E>;

    const NAME: &'static str = "values";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        vec![IntermediateStateDesc::new("values", E::ELEMENT_TYPE)]
    }

    fn init_state(ctx: &ExecContext) -> ValuesState<E> {
        ValuesState::new(ctx)
    }

    fn combine(state: &mut ValuesState<E>, value: &E) -> Result<(), String> {
        state.try_push(value.clone())
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        let block = blocks
            .first()
            .ok_or_else(|| "missing intermediate column values".to_string())?;
        block.typed::<E>().ok_or_else(|| {
            format!(
                "intermediate column values expected {} values, got {}",
                E::ELEMENT_TYPE,
                block.element_type()
            )
        })
    }

    fn merge_row(
        state: &mut ValuesState<E>,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        let block = *view;
        if block.is_null(position) {
            return Ok(());
        }
        let first = block.first_value_index(position);
        for index in first..first + block.value_count(position) {
            state.try_push(block.value(index).clone())?;
        }
        Ok(())
    }

    fn evaluate_intermediate(states: &[ValuesState<E>]) -> Vec<BlockImpl> {
        vec![values_block(states)]
    }

    fn evaluate_final(states: &[ValuesState<E>]) -> BlockImpl {
        values_block(states)
    }
}

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
use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::exec::agg::function::IntermediateStateDesc;
use crate::exec::agg::kernel::{AggregateKernel, intermediate_vector};
use crate::exec::agg::state::MinMaxState;
use crate::exec::block::{BlockBuilder, BlockImpl, Bytes, Element, ElementType, Vector};
use crate::runtime::exec_ctx::ExecContext;

/// Element types min/max can order. Doubles use the IEEE total order, so
/// NaN compares above every other value and the result never depends on
/// input order; bytes compare lexicographically.
pub trait OrderedElement: Element + Default {
    fn cmp_order(&self, other: &Self) -> Ordering;
}

impl OrderedElement for i32 {
    fn cmp_order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl OrderedElement for i64 {
    fn cmp_order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl OrderedElement for f64 {
    fn cmp_order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl OrderedElement for Bytes {
    fn cmp_order(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }
}

pub struct MinKernel<E>(PhantomData<E>);

pub struct MaxKernel<E>(PhantomData<E>);

/// Replaces the held value when `value` compares on the `keep` side of it;
/// ties keep the incumbent.
fn collect<E: OrderedElement>(state: &mut MinMaxState<E>, value: &E, keep: Ordering) {
    if !state.seen || value.cmp_order(&state.value) == keep {
        state.value = value.clone();
        state.seen = true;
    }
}

fn state_desc<E: Element>(name: &'static str) -> Vec<IntermediateStateDesc> {
    vec![
        IntermediateStateDesc::new(name, E::ELEMENT_TYPE),
        IntermediateStateDesc::new("seen", ElementType::Boolean),
    ]
}

type MergeView<'a, E> = (&'a Vector<E>, &'a Vector<bool>);

fn merge_view<'a, E: Element>(
    blocks: &[&'a BlockImpl],
    name: &str,
) -> Result<MergeView<'a, E>, String> {
    Ok((
        intermediate_vector::<E>(blocks, 0, name)?,
        intermediate_vector::<bool>(blocks, 1, "seen")?,
    ))
}

fn intermediate<E: Element>(states: &[MinMaxState<E>]) -> Vec<BlockImpl> {
    vec![
        BlockImpl::from(Vector::new(
            states.iter().map(|s| s.value.clone()).collect(),
        )),
        BlockImpl::from(Vector::new(states.iter().map(|s| s.seen).collect())),
    ]
}

fn final_block<E: Element>(states: &[MinMaxState<E>]) -> BlockImpl {
    let mut builder = BlockBuilder::<E>::with_capacity(states.len());
    for state in states {
        if state.seen {
            builder.append(state.value.clone());
        } else {
            builder.append_null();
        }
    }
    BlockImpl::from(builder.build())
}

impl<E: OrderedElement> AggregateKernel for MinKernel<E> {
    type Input = E;
    type State = MinMaxState<E>;
    type MergeView<'a> = MergeView<'a, E>;

    const NAME: &'static str = "min";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        state_desc::<E>("min")
    }

    fn init_state(_ctx: &ExecContext) -> MinMaxState<E> {
        MinMaxState::default()
    }

    fn combine(state: &mut MinMaxState<E>, value: &E) -> Result<(), String> {
        collect(state, value, Ordering::Less);
        Ok(())
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        merge_view::<E>(blocks, "min")
    }

    fn merge_row(
        state: &mut MinMaxState<E>,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        let (values, seen) = view;
        if *seen.get(position) {
            collect(state, values.get(position), Ordering::Less);
        }
        Ok(())
    }

    fn evaluate_intermediate(states: &[MinMaxState<E>]) -> Vec<BlockImpl> {
        intermediate(states)
    }

    fn evaluate_final(states: &[MinMaxState<E>]) -> BlockImpl {
        final_block(states)
    }
}

impl<E: OrderedElement> AggregateKernel for MaxKernel<E> {
    type Input = E;
    type State = MinMaxState<E>;
    type MergeView<'a> = MergeView<'a, E>;

    const NAME: &'static str = "max";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        state_desc::<E>("max")
    }

    fn init_state(_ctx: &ExecContext) -> MinMaxState<E> {
        MinMaxState::default()
    }

    fn combine(state: &mut MinMaxState<E>, value: &E) -> Result<(), String> {
        collect(state, value, Ordering::Greater);
        Ok(())
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        merge_view::<E>(blocks, "max")
    }

    fn merge_row(
        state: &mut MinMaxState<E>,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        let (values, seen) = view;
        if *seen.get(position) {
            collect(state, values.get(position), Ordering::Greater);
        }
        Ok(())
    }

    fn evaluate_intermediate(states: &[MinMaxState<E>]) -> Vec<BlockImpl> {
        intermediate(states)
    }

    fn evaluate_final(states: &[MinMaxState<E>]) -> BlockImpl {
        final_block(states)
    }
}

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
use crate::exec::agg::function::IntermediateStateDesc;
use crate::exec::agg::kernel::{AggregateKernel, intermediate_vector};
use crate::exec::agg::state::{KahanSumState, SumLongState};
use crate::exec::block::{BlockBuilder, BlockImpl, ElementType, Vector};
use crate::runtime::exec_ctx::ExecContext;

/// Sum over ints, widened to a long accumulator. Overflow past i64 is an
/// error rather than a wrap.
pub struct SumIntKernel;

/// Sum over longs. Overflow is an error rather than a wrap.
pub struct SumLongKernel;

/// Sum over doubles with Neumaier compensation carried through the
/// intermediate state, so a distributed sum loses no more precision than a
/// single-node one.
pub struct SumDoubleKernel;

fn long_state_desc() -> Vec<IntermediateStateDesc> {
    vec![
        IntermediateStateDesc::new("sum", ElementType::Long),
        IntermediateStateDesc::new("seen", ElementType::Boolean),
    ]
}

type LongMergeView<'a> = (&'a Vector<i64>, &'a Vector<bool>);

fn long_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<LongMergeView<'a>, String> {
    Ok((
        intermediate_vector::<i64>(blocks, 0, "sum")?,
        intermediate_vector::<bool>(blocks, 1, "seen")?,
    ))
}

fn long_merge_row(
    state: &mut SumLongState,
    view: &LongMergeView<'_>,
    position: usize,
) -> Result<(), String> {
    let (sum, seen) = view;
    if *seen.get(position) {
        state.add(*sum.get(position))?;
    }
    Ok(())
}

fn long_intermediate(states: &[SumLongState]) -> Vec<BlockImpl> {
    vec![
        BlockImpl::from(Vector::new(states.iter().map(|s| s.sum).collect())),
        BlockImpl::from(Vector::new(states.iter().map(|s| s.seen).collect())),
    ]
}

fn long_final(states: &[SumLongState]) -> BlockImpl {
    let mut builder = BlockBuilder::<i64>::with_capacity(states.len());
    for state in states {
        if state.seen {
            builder.append(state.sum);
        } else {
            builder.append_null();
        }
    }
    BlockImpl::from(builder.build())
}

impl AggregateKernel for SumIntKernel {
    type Input = i32;
    type State = SumLongState;
    type MergeView<'a> = LongMergeView<'a>;

    const NAME: &'static str = "sum";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        long_state_desc()
    }

    fn init_state(_ctx: &ExecContext) -> SumLongState {
        SumLongState::default()
    }

    fn combine(state: &mut SumLongState, value: &i32) -> Result<(), String> {
        state.add(i64::from(*value))
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        long_merge_view(blocks)
    }

    fn merge_row(
        state: &mut SumLongState,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        long_merge_row(state, view, position)
    }

    fn evaluate_intermediate(states: &[SumLongState]) -> Vec<BlockImpl> {
        long_intermediate(states)
    }

    fn evaluate_final(states: &[SumLongState]) -> BlockImpl {
        long_final(states)
    }
}

impl AggregateKernel for SumLongKernel {
    type Input = i64;
    type State = SumLongState;
    type MergeView<'a> = LongMergeView<'a>;

    const NAME: &'static str = "sum";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        long_state_desc()
    }

    fn init_state(_ctx: &ExecContext) -> SumLongState {
        SumLongState::default()
    }

    fn combine(state: &mut SumLongState, value: &i64) -> Result<(), String> {
        state.add(*value)
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        long_merge_view(blocks)
    }

    fn merge_row(
        state: &mut SumLongState,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        long_merge_row(state, view, position)
    }

    fn evaluate_intermediate(states: &[SumLongState]) -> Vec<BlockImpl> {
        long_intermediate(states)
    }

    fn evaluate_final(states: &[SumLongState]) -> BlockImpl {
        long_final(states)
    }
}

impl AggregateKernel for SumDoubleKernel {
    type Input = f64;
    type State = KahanSumState;
    type MergeView<'a> = (&'a Vector<f64>, &'a Vector<f64>, &'a Vector<bool>);

    const NAME: &'static str = "sum";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        vec![
            IntermediateStateDesc::new("value", ElementType::Double),
            IntermediateStateDesc::new("delta", ElementType::Double),
            IntermediateStateDesc::new("seen", ElementType::Boolean),
        ]
    }

    fn init_state(_ctx: &ExecContext) -> KahanSumState {
        KahanSumState::default()
    }

    fn combine(state: &mut KahanSumState, value: &f64) -> Result<(), String> {
        state.add(*value);
        Ok(())
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        Ok((
            intermediate_vector::<f64>(blocks, 0, "value")?,
            intermediate_vector::<f64>(blocks, 1, "delta")?,
            intermediate_vector::<bool>(blocks, 2, "seen")?,
        ))
    }

    fn merge_row(
        state: &mut KahanSumState,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        let (value, delta, seen) = view;
        if *seen.get(position) {
            state.add_with_delta(*value.get(position), *delta.get(position));
        }
        Ok(())
    }

    fn evaluate_intermediate(states: &[KahanSumState]) -> Vec<BlockImpl> {
        vec![
            BlockImpl::from(Vector::new(states.iter().map(|s| s.value).collect())),
            BlockImpl::from(Vector::new(states.iter().map(|s| s.delta).collect())),
            BlockImpl::from(Vector::new(states.iter().map(|s| s.seen).collect())),
        ]
    }

    fn evaluate_final(states: &[KahanSumState]) -> BlockImpl {
        let mut builder = BlockBuilder::<f64>::with_capacity(states.len());
        for state in states {
            if state.seen {
                // The residual delta rides along in the intermediate state
                // only; every add folds the pending correction back in, so
                // the compensated value is the result.
                builder.append(state.value);
            } else {
                builder.append_null();
            }
        }
        BlockImpl::from(builder.build())
    }
}

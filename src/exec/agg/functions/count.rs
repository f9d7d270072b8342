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
use crate::exec::agg::kernel::{AggregateKernel, intermediate_vector};
use crate::exec::block::{BlockImpl, Element, ElementType, Vector};
use crate::runtime::exec_ctx::ExecContext;

/// Counts present values, not rows: a multi-valued row adds its value count
/// and null rows add nothing. The identity is 0, so the final result is
/// never null.
pub struct CountKernel<E>(PhantomData<E>);

impl<E: Element> AggregateKernel for CountKernel<E> {
    type Input = E;
    type State = i64;
    type MergeView<'a> = (&'a Vector<i64>, &'a Vector<bool>);

    const NAME: &'static str = "count";

    fn intermediate_state() -> Vec<IntermediateStateDesc> {
        vec![
            IntermediateStateDesc::new("count", ElementType::Long),
            IntermediateStateDesc::new("seen", ElementType::Boolean),
        ]
    }

    fn describe() -> String {
        "count".to_string()
    }

    fn init_state(_ctx: &ExecContext) -> i64 {
        0
    }

    fn combine(state: &mut i64, _value: &E) -> Result<(), String> {
        *state += 1;
        Ok(())
    }

    fn build_merge_view<'a>(blocks: &[&'a BlockImpl]) -> Result<Self::MergeView<'a>, String> {
        Ok((
            intermediate_vector::<i64>(blocks, 0, "count")?,
            intermediate_vector::<bool>(blocks, 1, "seen")?,
        ))
    }

    fn merge_row(
        state: &mut i64,
        view: &Self::MergeView<'_>,
        position: usize,
    ) -> Result<(), String> {
        let (count, seen) = view;
        if *seen.get(position) {
            *state += *count.get(position);
        }
        Ok(())
    }

    fn evaluate_intermediate(states: &[i64]) -> Vec<BlockImpl> {
        vec![
            BlockImpl::from(Vector::new(states.to_vec())),
            BlockImpl::from(Vector::new(vec![true; states.len()])),
        ]
    }

    fn evaluate_final(states: &[i64]) -> BlockImpl {
        BlockImpl::from(Vector::new(states.to_vec()))
    }
}

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

//! The aggregate function catalog.
//!
//! [`supplier`] resolves a function name and input element type to a boxed
//! [`AggregatorFunctionSupplier`]. Most functions are kernels driven by the
//! generic machinery in the parent module; `last_over_time` wires its own
//! aggregators because it consumes two raw channels.

mod count;
mod last_over_time;
mod min_max;
mod sum;
mod values;

pub use count::CountKernel;
pub use last_over_time::{
    GroupingLastOverTimeFunction, LastOverTimeFunction, LastOverTimeSupplier,
};
pub use min_max::{MaxKernel, MinKernel, OrderedElement};
pub use sum::{SumDoubleKernel, SumIntKernel, SumLongKernel};
pub use values::ValuesKernel;

use crate::exec::agg::function::AggregatorFunctionSupplier;
use crate::exec::agg::kernel::{AggregateKernel, KernelSupplier};
use crate::exec::block::{Bytes, ElementType};

fn kernel_supplier<K: AggregateKernel>(
    channels: Vec<usize>,
) -> Result<Box<dyn AggregatorFunctionSupplier>, String> {
    Ok(Box::new(KernelSupplier::<K>::try_new(channels)?))
}

/// Resolves an aggregate function by name and raw input element type.
pub fn supplier(
    name: &str,
    element_type: ElementType,
    channels: Vec<usize>,
) -> Result<Box<dyn AggregatorFunctionSupplier>, String> {
    match (name, element_type) {
        ("count", ElementType::Boolean) => kernel_supplier::<CountKernel<bool>>(channels),
        ("count", ElementType::Int) => kernel_supplier::<CountKernel<i32>>(channels),
        ("count", ElementType::Long) => kernel_supplier::<CountKernel<i64>>(channels),
        ("count", ElementType::Double) => kernel_supplier::<CountKernel<f64>>(channels),
        ("count", ElementType::Bytes) => kernel_supplier::<CountKernel<Bytes>>(channels),
        ("sum", ElementType::Int) => kernel_supplier::<SumIntKernel>(channels),
        ("sum", ElementType::Long) => kernel_supplier::<SumLongKernel>(channels),
        ("sum", ElementType::Double) => kernel_supplier::<SumDoubleKernel>(channels),
        ("min", ElementType::Int) => kernel_supplier::<MinKernel<i32>>(channels),
        ("min", ElementType::Long) => kernel_supplier::<MinKernel<i64>>(channels),
        ("min", ElementType::Double) => kernel_supplier::<MinKernel<f64>>(channels),
        ("min", ElementType::Bytes) => kernel_supplier::<MinKernel<Bytes>>(channels),
        ("max", ElementType::Int) => kernel_supplier::<MaxKernel<i32>>(channels),
        ("max", ElementType::Long) => kernel_supplier::<MaxKernel<i64>>(channels),
        ("max", ElementType::Double) => kernel_supplier::<MaxKernel<f64>>(channels),
        ("max", ElementType::Bytes) => kernel_supplier::<MaxKernel<Bytes>>(channels),
        ("values", ElementType::Boolean) => kernel_supplier::<ValuesKernel<bool>>(channels),
        ("values", ElementType::Int) => kernel_supplier::<ValuesKernel<i32>>(channels),
        ("values", ElementType::Long) => kernel_supplier::<ValuesKernel<i64>>(channels),
        ("values", ElementType::Double) => kernel_supplier::<ValuesKernel<f64>>(channels),
        ("values", ElementType::Bytes) => kernel_supplier::<ValuesKernel<Bytes>>(channels),
        ("last_over_time", ElementType::Int) => {
            Ok(Box::new(LastOverTimeSupplier::<i32>::try_new(channels)?))
        }
        ("last_over_time", ElementType::Long) => {
            Ok(Box::new(LastOverTimeSupplier::<i64>::try_new(channels)?))
        }
        ("last_over_time", ElementType::Double) => {
            Ok(Box::new(LastOverTimeSupplier::<f64>::try_new(channels)?))
        }
        ("count" | "sum" | "min" | "max" | "values" | "last_over_time", other) => {
            Err(format!("no {name} aggregate over {other} input"))
        }
        (other, _) => Err(format!("unsupported aggregate function: {other}")),
    }
}

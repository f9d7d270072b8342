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

//! Two-phase aggregation over pages of blocks.
//!
//! An aggregation runs as a partial phase that folds raw input into per-node
//! state and ships it as intermediate pages, and a final phase that merges
//! those pages and emits results. [`AggregatorFunctionSupplier`] builds the
//! ungrouped and grouped aggregators for both phases;
//! [`IntermediateStateDesc`] pins the intermediate wire layout the two phases
//! agree on.

mod function;
pub use function::*;
mod kernel;
pub use kernel::*;

mod state;

pub mod functions;

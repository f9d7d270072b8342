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
//! Columnar block layer.
//!
//! Responsibilities:
//! - Defines the typed column containers batches are made of: dense vectors,
//!   nullable multi-valued blocks, and the dynamically typed `BlockImpl`.
//! - Provides append-only builders and the row mask used to select batch
//!   positions.
//!
//! Current limitations:
//! - The element type set is closed (boolean, int, long, double, bytes);
//!   new types are added here, not by implementing `Element` downstream.

mod any;
mod bitset;
mod block;
mod builder;
mod element;
mod mask;
mod vector;

pub use any::{BlockImpl, ConstantNullBlock};
pub use block::{
    ArrayBlock, Block, BlockShape, BooleanBlock, BytesBlock, DoubleBlock, IntBlock, LongBlock,
};
pub use builder::BlockBuilder;
pub use bytes::Bytes;
pub use element::{Element, ElementType};
pub use mask::Mask;
pub use vector::{BooleanVector, BytesVector, DoubleVector, IntVector, LongVector, Vector};

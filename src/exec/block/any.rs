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
use crate::exec::block::block::{
    Block, BooleanBlock, BytesBlock, DoubleBlock, IntBlock, LongBlock,
};
use crate::exec::block::element::{Element, ElementType};
use crate::exec::block::vector::Vector;

/// Dynamically typed block: the column currency of a page.
#[derive(Clone, Debug)]
pub enum BlockImpl {
    Boolean(BooleanBlock),
    Int(IntBlock),
    Long(LongBlock),
    Double(DoubleBlock),
    Bytes(BytesBlock),
    ConstantNull(ConstantNullBlock),
}

/// All-null rows with no backing storage, standing in for an absent column.
#[derive(Clone, Debug)]
pub struct ConstantNullBlock {
    positions: usize,
}

impl ConstantNullBlock {
    pub fn new(positions: usize) -> Self {
        Self { positions }
    }

    pub fn position_count(&self) -> usize {
        self.positions
    }
}

impl BlockImpl {
    pub fn constant_null(positions: usize) -> Self {
        BlockImpl::ConstantNull(ConstantNullBlock::new(positions))
    }

    pub fn position_count(&self) -> usize {
        match self {
            BlockImpl::Boolean(b) => b.position_count(),
            BlockImpl::Int(b) => b.position_count(),
            BlockImpl::Long(b) => b.position_count(),
            BlockImpl::Double(b) => b.position_count(),
            BlockImpl::Bytes(b) => b.position_count(),
            BlockImpl::ConstantNull(b) => b.position_count(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            BlockImpl::Boolean(_) => ElementType::Boolean,
            BlockImpl::Int(_) => ElementType::Int,
            BlockImpl::Long(_) => ElementType::Long,
            BlockImpl::Double(_) => ElementType::Double,
            BlockImpl::Bytes(_) => ElementType::Bytes,
            BlockImpl::ConstantNull(_) => ElementType::Null,
        }
    }

    /// O(1); true when every row is null.
    pub fn are_all_values_null(&self) -> bool {
        match self {
            BlockImpl::Boolean(b) => b.are_all_values_null(),
            BlockImpl::Int(b) => b.are_all_values_null(),
            BlockImpl::Long(b) => b.are_all_values_null(),
            BlockImpl::Double(b) => b.are_all_values_null(),
            BlockImpl::Bytes(b) => b.are_all_values_null(),
            BlockImpl::ConstantNull(_) => true,
        }
    }

    /// Typed downcast. `None` for a type mismatch and for constant-null
    /// blocks; callers treat all-null input before downcasting.
    pub fn typed<E: Element>(&self) -> Option<&Block<E>> {
        E::from_impl(self)
    }
}

impl<E: Element> From<Block<E>> for BlockImpl {
    fn from(block: Block<E>) -> Self {
        E::into_impl(block)
    }
}

impl<E: Element> From<Vector<E>> for BlockImpl {
    fn from(vector: Vector<E>) -> Self {
        E::into_impl(Block::from_vector(vector))
    }
}

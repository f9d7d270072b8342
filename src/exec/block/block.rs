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
use std::sync::Arc;

use bytes::Bytes;

use crate::exec::block::bitset::Bitset;
use crate::exec::block::element::{Element, ElementType};
use crate::exec::block::vector::Vector;

/// Column of rows that may be null or hold several values.
///
/// Rows are addressed by position. A row is either null, a single value, or
/// `value_count(p)` values stored contiguously starting at
/// `first_value_index(p)` in a dense value store. A block whose rows are all
/// single-valued and non-null is represented as a plain [`Vector`] and
/// reports it through [`Block::shape`] / [`Block::as_vector`]; consumers
/// branch once on the shape and keep the chosen loop free of null and
/// multi-value tests.
#[derive(Clone, Debug)]
pub struct Block<E> {
    repr: Repr<E>,
}

#[derive(Clone, Debug)]
enum Repr<E> {
    Dense(Vector<E>),
    General(ArrayBlock<E>),
}

/// General block representation: per-row spans over a shared value store plus
/// a null map. Nullness is tracked separately from span width, so a null row
/// and an explicitly-empty non-null row are distinct states.
#[derive(Clone, Debug)]
pub struct ArrayBlock<E> {
    values: Arc<[E]>,
    /// `position_count + 1` entries; row p spans
    /// `value_offsets[p]..value_offsets[p + 1]`.
    value_offsets: Arc<[u32]>,
    nulls: Arc<Bitset>,
    null_count: usize,
}

/// Shape of a block, returned by [`Block::shape`].
pub enum BlockShape<'a, E> {
    Dense(&'a Vector<E>),
    General(&'a ArrayBlock<E>),
}

impl<E: Element> ArrayBlock<E> {
    pub fn position_count(&self) -> usize {
        self.value_offsets.len() - 1
    }

    pub fn is_null(&self, position: usize) -> bool {
        self.nulls.get(position)
    }

    pub fn first_value_index(&self, position: usize) -> usize {
        self.value_offsets[position] as usize
    }

    pub fn value_count(&self, position: usize) -> usize {
        (self.value_offsets[position + 1] - self.value_offsets[position]) as usize
    }

    /// Value by storage index, not by position.
    pub fn value(&self, index: usize) -> &E {
        &self.values[index]
    }

    fn null_count(&self) -> usize {
        self.null_count
    }
}

impl<E: Element> Block<E> {
    pub fn from_vector(vector: Vector<E>) -> Self {
        Self {
            repr: Repr::Dense(vector),
        }
    }

    pub(crate) fn from_parts(
        values: Vec<E>,
        value_offsets: Vec<u32>,
        nulls: Bitset,
        null_count: usize,
    ) -> Self {
        debug_assert_eq!(value_offsets.len(), nulls.len() + 1);
        Self {
            repr: Repr::General(ArrayBlock {
                values: values.into(),
                value_offsets: value_offsets.into(),
                nulls: Arc::new(nulls),
                null_count,
            }),
        }
    }

    pub fn element_type(&self) -> ElementType {
        E::ELEMENT_TYPE
    }

    pub fn position_count(&self) -> usize {
        match &self.repr {
            Repr::Dense(vector) => vector.position_count(),
            Repr::General(rows) => rows.position_count(),
        }
    }

    pub fn shape(&self) -> BlockShape<'_, E> {
        match &self.repr {
            Repr::Dense(vector) => BlockShape::Dense(vector),
            Repr::General(rows) => BlockShape::General(rows),
        }
    }

    /// Cheap fast-path check: the backing vector when every row is
    /// single-valued and non-null, `None` otherwise.
    pub fn as_vector(&self) -> Option<&Vector<E>> {
        match &self.repr {
            Repr::Dense(vector) => Some(vector),
            Repr::General(_) => None,
        }
    }

    pub fn is_null(&self, position: usize) -> bool {
        match &self.repr {
            Repr::Dense(_) => false,
            Repr::General(rows) => rows.is_null(position),
        }
    }

    pub fn first_value_index(&self, position: usize) -> usize {
        match &self.repr {
            Repr::Dense(_) => position,
            Repr::General(rows) => rows.first_value_index(position),
        }
    }

    pub fn value_count(&self, position: usize) -> usize {
        match &self.repr {
            Repr::Dense(_) => 1,
            Repr::General(rows) => rows.value_count(position),
        }
    }

    /// Value by storage index, not by position.
    pub fn value(&self, index: usize) -> &E {
        match &self.repr {
            Repr::Dense(vector) => vector.get(index),
            Repr::General(rows) => rows.value(index),
        }
    }

    /// O(1); true when every row is null.
    pub fn are_all_values_null(&self) -> bool {
        match &self.repr {
            Repr::Dense(_) => false,
            Repr::General(rows) => rows.null_count() == rows.position_count(),
        }
    }
}

impl<E: Element> From<Vector<E>> for Block<E> {
    fn from(vector: Vector<E>) -> Self {
        Self::from_vector(vector)
    }
}

pub type BooleanBlock = Block<bool>;
pub type IntBlock = Block<i32>;
pub type LongBlock = Block<i64>;
pub type DoubleBlock = Block<f64>;
pub type BytesBlock = Block<Bytes>;

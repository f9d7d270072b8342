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

use crate::exec::block::element::{Element, ElementType};

/// Dense, non-null, single-valued column.
///
/// Immutable after construction; `Clone` shares the underlying storage, so
/// a vector can be reused across pages without copying.
#[derive(Clone, Debug)]
pub struct Vector<E> {
    values: Arc<[E]>,
}

impl<E: Element> Vector<E> {
    pub fn new(values: Vec<E>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        E::ELEMENT_TYPE
    }

    pub fn position_count(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, position: usize) -> &E {
        &self.values[position]
    }

    pub fn values(&self) -> &[E] {
        &self.values
    }
}

impl<E: Element> From<Vec<E>> for Vector<E> {
    fn from(values: Vec<E>) -> Self {
        Self::new(values)
    }
}

pub type BooleanVector = Vector<bool>;
pub type IntVector = Vector<i32>;
pub type LongVector = Vector<i64>;
pub type DoubleVector = Vector<f64>;
pub type BytesVector = Vector<Bytes>;

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
use std::fmt;

use bytes::Bytes;

use crate::exec::block::any::BlockImpl;
use crate::exec::block::block::Block;

/// Logical element type of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Boolean,
    Int,
    Long,
    Double,
    Bytes,
    /// Element type of a constant-null column; it carries no values.
    Null,
}

impl ElementType {
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Boolean => "boolean",
            ElementType::Int => "int",
            ElementType::Long => "long",
            ElementType::Double => "double",
            ElementType::Bytes => "bytes",
            ElementType::Null => "null",
        }
    }

    /// Plural form used in aggregate descriptions, e.g. "sum of longs".
    pub fn plural_name(&self) -> &'static str {
        match self {
            ElementType::Boolean => "booleans",
            ElementType::Int => "ints",
            ElementType::Long => "longs",
            ElementType::Double => "doubles",
            ElementType::Bytes => "bytes",
            ElementType::Null => "nulls",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for bytes::Bytes {}
}

/// Rust scalar backing one [`ElementType`].
///
/// Binds typed columns into the dynamically typed [`BlockImpl`] so the
/// aggregation machinery can be written once and monomorphized per type.
pub trait Element:
    sealed::Sealed + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const ELEMENT_TYPE: ElementType;

    fn from_impl(block: &BlockImpl) -> Option<&Block<Self>>;

    fn into_impl(block: Block<Self>) -> BlockImpl;

    /// Heap bytes owned beyond the inline value, for memory accounting.
    fn heap_bytes(&self) -> usize {
        0
    }
}

impl Element for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Boolean;

    fn from_impl(block: &BlockImpl) -> Option<&Block<bool>> {
        match block {
            BlockImpl::Boolean(b) => Some(b),
            _ => None,
        }
    }

    fn into_impl(block: Block<bool>) -> BlockImpl {
        BlockImpl::Boolean(block)
    }
}

impl Element for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::Int;

    fn from_impl(block: &BlockImpl) -> Option<&Block<i32>> {
        match block {
            BlockImpl::Int(b) => Some(b),
            _ => None,
        }
    }

    fn into_impl(block: Block<i32>) -> BlockImpl {
        BlockImpl::Int(block)
    }
}

impl Element for i64 {
    const ELEMENT_TYPE: ElementType = ElementType::Long;

    fn from_impl(block: &BlockImpl) -> Option<&Block<i64>> {
        match block {
            BlockImpl::Long(b) => Some(b),
            _ => None,
        }
    }

    fn into_impl(block: Block<i64>) -> BlockImpl {
        BlockImpl::Long(block)
    }
}

impl Element for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Double;

    fn from_impl(block: &BlockImpl) -> Option<&Block<f64>> {
        match block {
            BlockImpl::Double(b) => Some(b),
            _ => None,
        }
    }

    fn into_impl(block: Block<f64>) -> BlockImpl {
        BlockImpl::Double(block)
    }
}

impl Element for Bytes {
    const ELEMENT_TYPE: ElementType = ElementType::Bytes;

    fn from_impl(block: &BlockImpl) -> Option<&Block<Bytes>> {
        match block {
            BlockImpl::Bytes(b) => Some(b),
            _ => None,
        }
    }

    fn into_impl(block: Block<Bytes>) -> BlockImpl {
        BlockImpl::Bytes(block)
    }

    fn heap_bytes(&self) -> usize {
        self.len()
    }
}

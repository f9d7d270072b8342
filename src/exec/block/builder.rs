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
use crate::exec::block::bitset::Bitset;
use crate::exec::block::block::Block;
use crate::exec::block::element::Element;
use crate::exec::block::vector::Vector;

/// Append-only block constructor.
///
/// `append` outside a position entry writes one single-valued row;
/// `begin_position_entry` / `end_position_entry` bracket a multi-valued row
/// (an empty entry yields an empty non-null row). `build` collapses to the
/// dense vector representation when every row came out single-valued and
/// non-null.
///
/// Misuse (unbalanced entries, `append_null` inside an entry) is a
/// programming error and panics, like out-of-bounds indexing.
#[derive(Debug)]
pub struct BlockBuilder<E> {
    values: Vec<E>,
    value_offsets: Vec<u32>,
    nulls: Bitset,
    null_count: usize,
    entry_open: bool,
    dense: bool,
}

impl<E: Element> BlockBuilder<E> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(positions: usize) -> Self {
        let mut value_offsets = Vec::with_capacity(positions + 1);
        value_offsets.push(0);
        Self {
            values: Vec::with_capacity(positions),
            value_offsets,
            nulls: Bitset::with_capacity(positions),
            null_count: 0,
            entry_open: false,
            dense: true,
        }
    }

    pub fn position_count(&self) -> usize {
        self.value_offsets.len() - 1 + usize::from(self.entry_open)
    }

    /// Append one value: a single-valued row on its own, or one more value
    /// of the open position entry.
    pub fn append(&mut self, value: E) {
        self.values.push(value);
        if !self.entry_open {
            self.close_row(false);
        }
    }

    pub fn append_null(&mut self) {
        assert!(!self.entry_open, "append_null inside a position entry");
        self.close_row(true);
    }

    pub fn begin_position_entry(&mut self) {
        assert!(!self.entry_open, "position entry already open");
        self.entry_open = true;
    }

    pub fn end_position_entry(&mut self) {
        assert!(self.entry_open, "no open position entry");
        self.entry_open = false;
        self.close_row(false);
    }

    fn close_row(&mut self, null: bool) {
        let end = self.values.len() as u32;
        let width = end - *self.value_offsets.last().expect("offsets start with 0");
        self.value_offsets.push(end);
        self.nulls.push(null);
        if null {
            self.null_count += 1;
            self.dense = false;
        } else if width != 1 {
            self.dense = false;
        }
    }

    pub fn build(self) -> Block<E> {
        assert!(!self.entry_open, "unclosed position entry");
        if self.dense {
            Block::from_vector(Vector::new(self.values))
        } else {
            Block::from_parts(self.values, self.value_offsets, self.nulls, self.null_count)
        }
    }
}

impl<E: Element> Default for BlockBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_single_valued_collapses_to_vector() {
        let mut builder = BlockBuilder::<i64>::with_capacity(3);
        builder.append(7);
        builder.append(8);
        builder.append(9);
        let block = builder.build();
        let vector = block.as_vector().expect("dense block");
        assert_eq!(vector.values(), &[7, 8, 9]);
        assert!(!block.are_all_values_null());
    }

    #[test]
    fn test_single_value_entry_still_collapses() {
        let mut builder = BlockBuilder::<i64>::new();
        builder.append(1);
        builder.begin_position_entry();
        builder.append(2);
        builder.end_position_entry();
        let block = builder.build();
        assert!(block.as_vector().is_some());
        assert_eq!(block.position_count(), 2);
    }

    #[test]
    fn test_null_row_forces_general_shape() {
        let mut builder = BlockBuilder::<f64>::new();
        builder.append(1.5);
        builder.append_null();
        let block = builder.build();
        assert!(block.as_vector().is_none());
        assert!(!block.is_null(0));
        assert!(block.is_null(1));
        assert_eq!(block.value_count(0), 1);
        assert_eq!(block.value_count(1), 0);
        assert!(!block.are_all_values_null());
    }

    #[test]
    fn test_multi_valued_row_spans() {
        let mut builder = BlockBuilder::<i64>::new();
        builder.append(10);
        builder.begin_position_entry();
        builder.append(20);
        builder.append(21);
        builder.append(22);
        builder.end_position_entry();
        builder.append(30);
        let block = builder.build();
        assert!(block.as_vector().is_none());
        assert_eq!(block.position_count(), 3);
        assert_eq!(block.first_value_index(1), 1);
        assert_eq!(block.value_count(1), 3);
        assert_eq!(*block.value(block.first_value_index(1) + 2), 22);
        assert_eq!(block.first_value_index(2), 4);
        assert_eq!(block.value_count(2), 1);
    }

    #[test]
    fn test_empty_entry_is_not_null() {
        let mut builder = BlockBuilder::<i64>::new();
        builder.begin_position_entry();
        builder.end_position_entry();
        builder.append_null();
        let block = builder.build();
        // Both rows are zero-width; only the second is null.
        assert_eq!(block.value_count(0), 0);
        assert!(!block.is_null(0));
        assert_eq!(block.value_count(1), 0);
        assert!(block.is_null(1));
        assert!(!block.are_all_values_null());
    }

    #[test]
    fn test_all_null_rows_reported() {
        let mut builder = BlockBuilder::<i32>::new();
        builder.append_null();
        builder.append_null();
        let block = builder.build();
        assert!(block.are_all_values_null());
    }

    #[test]
    #[should_panic(expected = "unclosed position entry")]
    fn test_build_with_open_entry_panics() {
        let mut builder = BlockBuilder::<i64>::new();
        builder.begin_position_entry();
        builder.append(1);
        let _ = builder.build();
    }
}

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

/// Row selector applied to one page-sized batch.
///
/// `all_true` / `all_false` are O(1) so consumers can short-circuit whole
/// batches before looking at a single row.
#[derive(Clone, Debug)]
pub struct Mask {
    repr: MaskRepr,
}

#[derive(Clone, Debug)]
enum MaskRepr {
    Constant { value: bool, positions: usize },
    Bits { bits: Bitset, true_count: usize },
}

impl Mask {
    /// Uniform mask with no per-row storage.
    pub fn constant(value: bool, positions: usize) -> Self {
        Self {
            repr: MaskRepr::Constant { value, positions },
        }
    }

    pub fn from_bools(values: &[bool]) -> Self {
        let mut bits = Bitset::with_capacity(values.len());
        let mut true_count = 0;
        for &value in values {
            bits.push(value);
            if value {
                true_count += 1;
            }
        }
        Self {
            repr: MaskRepr::Bits { bits, true_count },
        }
    }

    pub fn position_count(&self) -> usize {
        match &self.repr {
            MaskRepr::Constant { positions, .. } => *positions,
            MaskRepr::Bits { bits, .. } => bits.len(),
        }
    }

    pub fn all_true(&self) -> bool {
        match &self.repr {
            MaskRepr::Constant { value, .. } => *value,
            MaskRepr::Bits { bits, true_count } => *true_count == bits.len(),
        }
    }

    pub fn all_false(&self) -> bool {
        match &self.repr {
            MaskRepr::Constant { value, .. } => !*value,
            MaskRepr::Bits { true_count, .. } => *true_count == 0,
        }
    }

    pub fn selected(&self, position: usize) -> bool {
        match &self.repr {
            MaskRepr::Constant { value, .. } => *value,
            MaskRepr::Bits { bits, .. } => bits.get(position),
        }
    }
}

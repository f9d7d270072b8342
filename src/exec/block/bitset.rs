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

/// Compact growable bit storage backing null maps and row masks.
#[derive(Clone, Debug, Default)]
pub(crate) struct Bitset {
    bits: Vec<u8>,
    len: usize,
}

impl Bitset {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn push(&mut self, value: bool) {
        let byte_idx = self.len / 8;
        if byte_idx == self.bits.len() {
            self.bits.push(0);
        }
        if value {
            let bit_idx = (self.len % 8) as u8;
            self.bits[byte_idx] |= 1u8 << bit_idx;
        }
        self.len += 1;
    }

    pub(crate) fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        let byte_idx = index / 8;
        let bit_idx = (index % 8) as u8;
        (self.bits[byte_idx] & (1u8 << bit_idx)) != 0
    }

    pub(crate) fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

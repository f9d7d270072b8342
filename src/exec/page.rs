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
use crate::exec::block::BlockImpl;

/// One batch of same-length columns flowing through the pipeline.
///
/// Columns are addressed by integer channel index, not by name; the mapping
/// from channels to semantic columns is established by the plan. A page is
/// immutable once published; its blocks are shared by cheap clone.
#[derive(Clone, Debug)]
pub struct Page {
    blocks: Vec<BlockImpl>,
    position_count: usize,
}

impl Page {
    pub fn try_new(blocks: Vec<BlockImpl>) -> Result<Self, String> {
        let Some(first) = blocks.first() else {
            return Err("page requires at least one block".to_string());
        };
        let position_count = first.position_count();
        for (channel, block) in blocks.iter().enumerate().skip(1) {
            if block.position_count() != position_count {
                return Err(format!(
                    "page blocks disagree on position count: channel 0 has {}, channel {} has {}",
                    position_count,
                    channel,
                    block.position_count()
                ));
            }
        }
        Ok(Self {
            blocks,
            position_count,
        })
    }

    pub fn new(blocks: Vec<BlockImpl>) -> Self {
        match Self::try_new(blocks) {
            Ok(page) => page,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn position_count(&self) -> usize {
        self.position_count
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Channel access; panics on an out-of-range channel like slice indexing.
    pub fn block(&self, channel: usize) -> &BlockImpl {
        &self.blocks[channel]
    }

    /// Channel access for plan-provided channel lists, where out-of-range
    /// means a wiring bug worth a descriptive error.
    pub fn try_block(&self, channel: usize) -> Result<&BlockImpl, String> {
        self.blocks.get(channel).ok_or_else(|| {
            format!(
                "page has {} blocks; channel {} out of range",
                self.blocks.len(),
                channel
            )
        })
    }

    pub fn blocks(&self) -> &[BlockImpl] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::block::{DoubleVector, LongVector};

    #[test]
    fn test_try_new_rejects_length_mismatch() {
        let err = Page::try_new(vec![
            BlockImpl::from(LongVector::new(vec![1, 2, 3])),
            BlockImpl::from(DoubleVector::new(vec![0.5])),
        ])
        .expect_err("expected mismatch error");
        assert!(err.contains("disagree on position count"), "got: {err}");
        assert!(err.contains("channel 1"), "got: {err}");
    }

    #[test]
    fn test_try_new_rejects_empty_page() {
        let err = Page::try_new(Vec::new()).expect_err("expected empty error");
        assert!(err.contains("at least one block"), "got: {err}");
    }

    #[test]
    fn test_channel_access() {
        let page = Page::new(vec![
            BlockImpl::from(LongVector::new(vec![1, 2])),
            BlockImpl::constant_null(2),
        ]);
        assert_eq!(page.position_count(), 2);
        assert_eq!(page.block_count(), 2);
        assert!(page.block(1).are_all_values_null());
        let err = page.try_block(7).expect_err("expected range error");
        assert!(err.contains("channel 7 out of range"), "got: {err}");
    }
}

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
//! Common utilities and helpers for integration tests.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;
use tempfile::TempDir;

use riptide::exec::block::{
    Block, BlockBuilder, BlockImpl, Bytes, Element, IntBlock, Vector,
};
use riptide::exec::page::Page;
use riptide::riptide_config;
use riptide::riptide_logging;
use riptide::runtime::exec_ctx::ExecContext;
use riptide::runtime::mem_tracker::MemTracker;

/// Test configuration for integration tests.
pub struct TestConfig {
    /// Temporary directory for test artifacts
    pub temp_dir: TempDir,
    /// Test config path
    pub config_path: PathBuf,
}

impl TestConfig {
    /// Create a new test configuration with default settings.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config_path = temp_dir.path().join("test_riptide.toml");

        // Create a minimal test config
        let config_content = r#"
log_level = "debug"

[compute]
mem_limit_bytes = 268435456
"#;

        std::fs::write(&config_path, config_content)?;

        Ok(Self {
            temp_dir,
            config_path,
        })
    }

    /// Initialize logging for tests.
    pub fn init_logging(&self) {
        riptide_logging::init_with_level("debug");
    }

    /// Load the test configuration.
    pub fn load_config(&self) -> anyhow::Result<&'static riptide_config::RiptideConfig> {
        riptide_config::init_from_path(&self.config_path)
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new().expect("Failed to create test config")
    }
}

/// Execution context backed by an unlimited root tracker.
pub fn test_ctx() -> ExecContext {
    ExecContext::new(MemTracker::new_root("test"))
}

/// Execution context whose root tracker enforces `limit` bytes.
pub fn limited_ctx(limit: i64) -> ExecContext {
    ExecContext::new(MemTracker::new_root_with_limit("test", limit))
}

pub fn page(blocks: Vec<BlockImpl>) -> Page {
    Page::new(blocks)
}

/// Dense single-valued block without nulls.
pub fn dense_block<E: Element>(values: &[E]) -> BlockImpl {
    BlockImpl::from(Vector::new(values.to_vec()))
}

/// Single-valued block where `None` positions are null.
pub fn nullable_block<E: Element>(values: &[Option<E>]) -> BlockImpl {
    let mut builder = BlockBuilder::<E>::with_capacity(values.len());
    for value in values {
        match value {
            Some(value) => builder.append(value.clone()),
            None => builder.append_null(),
        }
    }
    BlockImpl::from(builder.build())
}

/// Block where each position carries zero or more values; an empty slice
/// becomes a null position.
pub fn multi_valued_block<E: Element>(rows: &[&[E]]) -> BlockImpl {
    let mut builder = BlockBuilder::<E>::with_capacity(rows.len());
    for row in rows {
        match row {
            [] => builder.append_null(),
            [value] => builder.append(value.clone()),
            values => {
                builder.begin_position_entry();
                for value in *values {
                    builder.append(value.clone());
                }
                builder.end_position_entry();
            }
        }
    }
    BlockImpl::from(builder.build())
}

pub fn bytes_block(values: &[&str]) -> BlockImpl {
    let values: Vec<Bytes> = values
        .iter()
        .map(|s| Bytes::copy_from_slice(s.as_bytes()))
        .collect();
    dense_block(&values)
}

/// Group ordinals as the dense int block the grouped protocol expects.
pub fn ordinals(values: &[i32]) -> IntBlock {
    Block::from_vector(Vector::new(values.to_vec()))
}

/// Reads a single-valued column back out of a block, `None` where null.
pub fn scalar_column<E: Element>(block: &BlockImpl) -> Vec<Option<E>> {
    if let BlockImpl::ConstantNull(_) = block {
        return vec![None; block.position_count()];
    }
    let typed = block.typed::<E>().expect("column has the expected type");
    (0..typed.position_count())
        .map(|position| {
            if typed.is_null(position) {
                None
            } else {
                assert_eq!(typed.value_count(position), 1, "expected one value");
                Some(typed.value(typed.first_value_index(position)).clone())
            }
        })
        .collect()
}

/// Reads a possibly multi-valued column, null positions as empty rows.
pub fn multi_column<E: Element>(block: &BlockImpl) -> Vec<Vec<E>> {
    if let BlockImpl::ConstantNull(_) = block {
        return vec![Vec::new(); block.position_count()];
    }
    let typed = block.typed::<E>().expect("column has the expected type");
    (0..typed.position_count())
        .map(|position| {
            if typed.is_null(position) {
                return Vec::new();
            }
            let first = typed.first_value_index(position);
            (first..first + typed.value_count(position))
                .map(|index| typed.value(index).clone())
                .collect()
        })
        .collect()
}

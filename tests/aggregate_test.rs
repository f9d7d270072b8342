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
//! Ungrouped aggregation protocol tests: the two-phase partial/final
//! exchange, masking, multi-valued rows and the error surface.

mod common;

use common::{
    TestConfig, bytes_block, dense_block, limited_ctx, multi_column, multi_valued_block,
    nullable_block, page, scalar_column, test_ctx,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riptide::aggregate_supplier;
use riptide::exec::block::{BlockImpl, Bytes, ElementType, Mask};
use riptide::exec::page::Page;
use riptide::{AggregatorFunction, ExecContext};

/// Evaluates one aggregator's intermediate state as a one-position page.
fn intermediate_page(agg: &dyn AggregatorFunction, ctx: &ExecContext) -> Page {
    let mut out: Vec<Option<BlockImpl>> = vec![None; agg.intermediate_block_count()];
    agg.evaluate_intermediate(&mut out, 0, ctx)
        .expect("evaluate intermediate");
    Page::new(
        out.into_iter()
            .map(|block| block.expect("intermediate block"))
            .collect(),
    )
}

fn final_block(agg: &dyn AggregatorFunction, ctx: &ExecContext) -> BlockImpl {
    let mut out: Vec<Option<BlockImpl>> = vec![None];
    agg.evaluate_final(&mut out, 0, ctx).expect("evaluate final");
    out[0].take().expect("final block")
}

/// Single instance fed every page directly, then evaluated to the final
/// result.
fn run_direct(
    name: &str,
    element_type: ElementType,
    channels: Vec<usize>,
    feeds: &[(&Page, Mask)],
) -> BlockImpl {
    let ctx = test_ctx();
    let supplier = aggregate_supplier(name, element_type, channels).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);
    for (input, mask) in feeds {
        agg.add_raw_input(input, mask).expect("raw input");
    }
    let out = final_block(agg.as_ref(), &ctx);
    agg.close();
    out
}

/// One partial instance per input page, each shipping a one-position
/// intermediate page into a single final instance.
fn run_two_phase(
    name: &str,
    element_type: ElementType,
    channels: Vec<usize>,
    inputs: &[&Page],
) -> BlockImpl {
    let ctx = test_ctx();
    let partial_supplier =
        aggregate_supplier(name, element_type, channels).expect("partial supplier");

    let mut intermediates = Vec::new();
    for input in inputs {
        let mut partial = partial_supplier.aggregator(&ctx);
        partial
            .add_raw_input(input, &Mask::constant(true, input.position_count()))
            .expect("raw input");
        intermediates.push(intermediate_page(partial.as_ref(), &ctx));
        partial.close();
    }

    let state_channels: Vec<usize> = (0..intermediates[0].block_count()).collect();
    let final_supplier =
        aggregate_supplier(name, element_type, state_channels).expect("final supplier");
    let mut final_agg = final_supplier.aggregator(&ctx);
    for intermediate in &intermediates {
        final_agg
            .add_intermediate_input(intermediate)
            .expect("merge intermediate");
    }
    let out = final_block(final_agg.as_ref(), &ctx);
    final_agg.close();
    out
}

#[test]
fn test_config_and_logging_bootstrap() {
    let test_config = TestConfig::new().expect("Failed to create test config");
    test_config.init_logging();
    let config = test_config.load_config().expect("Failed to load config");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.compute.mem_limit_bytes, 268_435_456);
}

#[test]
fn test_sum_long_two_phase_matches_direct() {
    let pages = [
        page(vec![dense_block::<i64>(&[1, 2, 3])]),
        page(vec![nullable_block::<i64>(&[Some(4), None, Some(5)])]),
        page(vec![dense_block::<i64>(&[6, 7, 8, 9])]),
    ];

    let direct = run_direct(
        "sum",
        ElementType::Long,
        vec![0],
        &[
            (&pages[0], Mask::constant(true, 3)),
            (&pages[1], Mask::constant(true, 3)),
            (&pages[2], Mask::constant(true, 4)),
        ],
    );
    let merged = run_two_phase(
        "sum",
        ElementType::Long,
        vec![0],
        &[&pages[0], &pages[1], &pages[2]],
    );

    assert_eq!(scalar_column::<i64>(&direct), vec![Some(45)]);
    assert_eq!(scalar_column::<i64>(&merged), vec![Some(45)]);
}

#[test]
fn test_random_partitions_merge_to_the_same_sum() {
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..8 {
        let len = rng.gen_range(1..=40);
        let values: Vec<i64> = (0..len).map(|_| rng.gen_range(-1000..1000)).collect();
        let expected: i64 = values.iter().sum();

        // Split the rows into pages at random boundaries; the merge result
        // must not depend on how the input was sharded.
        let mut pages = Vec::new();
        let mut rest = values.as_slice();
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len());
            pages.push(page(vec![dense_block::<i64>(&rest[..take])]));
            rest = &rest[take..];
        }
        let inputs: Vec<&Page> = pages.iter().collect();

        let merged = run_two_phase("sum", ElementType::Long, vec![0], &inputs);
        assert_eq!(
            scalar_column::<i64>(&merged),
            vec![Some(expected)],
            "round {round} split into {} pages",
            inputs.len()
        );
    }
}

#[test]
fn test_count_counts_values_not_rows() {
    // Four rows, six values: a multi-valued row counts once per value and
    // the null row not at all.
    let input = page(vec![multi_valued_block::<i64>(&[
        &[1],
        &[2, 3, 4],
        &[],
        &[5, 6],
    ])]);

    let direct = run_direct(
        "count",
        ElementType::Long,
        vec![0],
        &[(&input, Mask::constant(true, 4))],
    );
    let merged = run_two_phase("count", ElementType::Long, vec![0], &[&input]);

    assert_eq!(scalar_column::<i64>(&direct), vec![Some(6)]);
    assert_eq!(scalar_column::<i64>(&merged), vec![Some(6)]);
}

#[test]
fn test_unfed_aggregates_yield_identity() {
    let count = run_direct("count", ElementType::Long, vec![0], &[]);
    assert_eq!(scalar_column::<i64>(&count), vec![Some(0)]);

    let sum = run_direct("sum", ElementType::Long, vec![0], &[]);
    assert_eq!(scalar_column::<i64>(&sum), vec![None]);

    let min = run_direct("min", ElementType::Double, vec![0], &[]);
    assert_eq!(scalar_column::<f64>(&min), vec![None]);

    let values = run_direct("values", ElementType::Long, vec![0], &[]);
    assert_eq!(multi_column::<i64>(&values), vec![Vec::<i64>::new()]);
}

#[test]
fn test_close_is_idempotent_and_rejects_input() {
    let ctx = test_ctx();
    let supplier = aggregate_supplier("sum", ElementType::Long, vec![0]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);
    agg.close();
    agg.close();

    let input = page(vec![dense_block::<i64>(&[1])]);
    let err = agg
        .add_raw_input(&input, &Mask::constant(true, 1))
        .expect_err("input after close");
    assert!(err.contains("has been closed"), "got: {err}");

    let mut out: Vec<Option<BlockImpl>> = vec![None];
    let err = agg
        .evaluate_final(&mut out, 0, &ctx)
        .expect_err("evaluate after close");
    assert!(err.contains("has been closed"), "got: {err}");
}

#[test]
fn test_all_false_mask_leaves_state_unchanged() {
    let fed = page(vec![dense_block::<i64>(&[1, 2, 3])]);
    let skipped = page(vec![dense_block::<i64>(&[100, 200])]);

    let out = run_direct(
        "sum",
        ElementType::Long,
        vec![0],
        &[
            (&fed, Mask::constant(true, 3)),
            (&skipped, Mask::constant(false, 2)),
        ],
    );
    assert_eq!(scalar_column::<i64>(&out), vec![Some(6)]);
}

#[test]
fn test_complementary_masks_match_all_true() {
    let input = page(vec![dense_block::<i64>(&[10, 20, 30, 40])]);

    let split = run_direct(
        "sum",
        ElementType::Long,
        vec![0],
        &[
            (&input, Mask::from_bools(&[true, false, true, false])),
            (&input, Mask::from_bools(&[false, true, false, true])),
        ],
    );
    let whole = run_direct(
        "sum",
        ElementType::Long,
        vec![0],
        &[(&input, Mask::constant(true, 4))],
    );

    assert_eq!(scalar_column::<i64>(&split), scalar_column::<i64>(&whole));
    assert_eq!(scalar_column::<i64>(&whole), vec![Some(100)]);
}

#[test]
fn test_mask_excludes_multi_valued_row_whole() {
    let input = page(vec![multi_valued_block::<i64>(&[&[1], &[2, 3, 4], &[5]])]);

    let out = run_direct(
        "sum",
        ElementType::Long,
        vec![0],
        &[(&input, Mask::from_bools(&[true, false, true]))],
    );
    assert_eq!(scalar_column::<i64>(&out), vec![Some(6)]);
}

#[test]
fn test_last_over_time_keeps_latest_selected_value() {
    // Values [1.0, 2.0, null, (4.0, 5.0)] against timestamps [10, 20, 30, 40]
    // with the last row masked out: only (10, 1.0) and (20, 2.0) count.
    let input = page(vec![
        multi_valued_block::<f64>(&[&[1.0], &[2.0], &[], &[4.0, 5.0]]),
        dense_block::<i64>(&[10, 20, 30, 40]),
    ]);
    let mask = Mask::from_bools(&[true, true, true, false]);

    let direct = run_direct(
        "last_over_time",
        ElementType::Double,
        vec![0, 1],
        &[(&input, mask)],
    );
    assert_eq!(scalar_column::<f64>(&direct), vec![Some(2.0)]);

    // Unmasked, the multi-valued row at timestamp 40 wins with its first
    // value.
    let unmasked = run_two_phase("last_over_time", ElementType::Double, vec![0, 1], &[&input]);
    assert_eq!(scalar_column::<f64>(&unmasked), vec![Some(4.0)]);
}

#[test]
fn test_all_null_intermediate_channel_is_noop() {
    let ctx = test_ctx();
    let final_supplier =
        aggregate_supplier("sum", ElementType::Long, vec![0, 1]).expect("supplier");
    let mut agg = final_supplier.aggregator(&ctx);

    // A live partial result.
    let partial_supplier =
        aggregate_supplier("sum", ElementType::Long, vec![0]).expect("supplier");
    let mut partial = partial_supplier.aggregator(&ctx);
    partial
        .add_raw_input(
            &page(vec![dense_block::<i64>(&[5])]),
            &Mask::constant(true, 1),
        )
        .expect("raw input");
    agg.add_intermediate_input(&intermediate_page(partial.as_ref(), &ctx))
        .expect("merge");

    // An all-null partial result, with a position count that would be
    // rejected were it not discarded first.
    let empty = page(vec![
        BlockImpl::constant_null(3),
        BlockImpl::constant_null(3),
    ]);
    agg.add_intermediate_input(&empty).expect("all-null no-op");

    assert_eq!(
        scalar_column::<i64>(&final_block(agg.as_ref(), &ctx)),
        vec![Some(5)]
    );
}

#[test]
fn test_wrong_intermediate_position_count_errors() {
    let ctx = test_ctx();
    let supplier = aggregate_supplier("sum", ElementType::Long, vec![0, 1]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);

    let two_rows = page(vec![
        dense_block::<i64>(&[1, 2]),
        dense_block::<bool>(&[true, true]),
    ]);
    let err = agg
        .add_intermediate_input(&two_rows)
        .expect_err("must reject");
    assert!(
        err.contains("exactly one position, got 2"),
        "got: {err}"
    );
}

#[test]
fn test_sum_long_overflow_is_an_error() {
    let ctx = test_ctx();
    let supplier = aggregate_supplier("sum", ElementType::Long, vec![0]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);

    let input = page(vec![dense_block::<i64>(&[i64::MAX, 1])]);
    let err = agg
        .add_raw_input(&input, &Mask::constant(true, 2))
        .expect_err("overflow");
    assert!(err.contains("overflow"), "got: {err}");
}

#[test]
fn test_sum_double_carries_compensation_across_merge() {
    // Naive left-to-right addition flattens every 1e-16 into 1.0; the
    // compensated sum keeps them, including across the intermediate
    // exchange where the correction term rides its own column.
    let first = page(vec![dense_block::<f64>(&[
        1.0, 1e-16, 1e-16, 1e-16, 1e-16, 1e-16,
    ])]);
    let second = page(vec![dense_block::<f64>(&[1e-16, 1e-16, 1e-16, 1e-16, 1e-16])]);

    let out = run_two_phase("sum", ElementType::Double, vec![0], &[&first, &second]);
    let got = scalar_column::<f64>(&out)[0].expect("non-null");
    assert!(got > 1.0, "compensation lost: {got}");
    assert!(
        (got - 1.000_000_000_000_001).abs() < 5e-16,
        "got {got}, expected about 1.000000000000001"
    );
}

#[test]
fn test_min_max_double_total_order_handles_nan() {
    let input = page(vec![dense_block::<f64>(&[f64::NAN, 1.0, -2.5])]);

    let min = run_direct(
        "min",
        ElementType::Double,
        vec![0],
        &[(&input, Mask::constant(true, 3))],
    );
    assert_eq!(scalar_column::<f64>(&min), vec![Some(-2.5)]);

    // NaN sorts above every number in the total order, so max is NaN and
    // deterministically so regardless of arrival order.
    let max = run_two_phase("max", ElementType::Double, vec![0], &[&input]);
    let got = scalar_column::<f64>(&max)[0].expect("non-null");
    assert!(got.is_nan(), "got: {got}");
}

#[test]
fn test_min_bytes_is_lexicographic() {
    let input = page(vec![bytes_block(&["pear", "apple", "plum"])]);

    let out = run_two_phase("min", ElementType::Bytes, vec![0], &[&input]);
    assert_eq!(
        scalar_column::<Bytes>(&out),
        vec![Some(Bytes::copy_from_slice(b"apple"))]
    );
}

#[test]
fn test_values_collects_every_value_across_phases() {
    let first = page(vec![multi_valued_block::<i64>(&[&[1, 2], &[], &[3]])]);
    let second = page(vec![nullable_block::<i64>(&[Some(2), None, Some(4)])]);

    let out = run_two_phase("values", ElementType::Long, vec![0], &[&first, &second]);
    let mut got = multi_column::<i64>(&out)[0].clone();
    got.sort_unstable();
    // A multiset: the repeated 2 stays.
    assert_eq!(got, vec![1, 2, 2, 3, 4]);
}

#[test]
fn test_type_mismatch_is_a_descriptive_error() {
    let ctx = test_ctx();
    let supplier = aggregate_supplier("sum", ElementType::Long, vec![0]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);

    let input = page(vec![dense_block::<f64>(&[1.0])]);
    let err = agg
        .add_raw_input(&input, &Mask::constant(true, 1))
        .expect_err("type mismatch");
    assert!(
        err.contains("expected long input at channel 0, got double"),
        "got: {err}"
    );
}

#[test]
fn test_last_over_time_requires_dense_timestamps() {
    let ctx = test_ctx();
    let supplier =
        aggregate_supplier("last_over_time", ElementType::Double, vec![0, 1]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);

    let input = page(vec![
        dense_block::<f64>(&[1.0, 2.0]),
        nullable_block::<i64>(&[Some(10), None]),
    ]);
    let err = agg
        .add_raw_input(&input, &Mask::constant(true, 2))
        .expect_err("block-shaped timestamps");
    assert!(
        err.contains("requires a dense timestamp vector at channel 1"),
        "got: {err}"
    );
}

#[test]
fn test_values_respects_memory_limit() {
    let ctx = limited_ctx(128);
    let supplier = aggregate_supplier("values", ElementType::Long, vec![0]).expect("supplier");
    let mut agg = supplier.aggregator(&ctx);

    let values: Vec<i64> = (0..1024).collect();
    let input = page(vec![dense_block::<i64>(&values)]);
    let err = agg
        .add_raw_input(&input, &Mask::constant(true, values.len()))
        .expect_err("limit breach");
    assert!(err.contains("memory limit exceeded"), "got: {err}");

    agg.close();
    assert_eq!(ctx.mem_tracker().current(), 0);
}

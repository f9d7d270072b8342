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
use crate::exec::block::Element;
use crate::runtime::exec_ctx::ExecContext;
use crate::runtime::mem_tracker::MemReservation;

/// Dense per-group state array for grouping aggregates, indexed by group
/// ordinal.
///
/// Ordinals arrive sparsely and repeatedly; the array grows to cover the
/// largest ordinal seen and every new slot is initialized exactly once.
/// Growth is charged to the task's memory reservation so high-cardinality
/// grouping fails with an error instead of exhausting the process.
#[derive(Debug)]
pub struct GroupStates<S> {
    states: Vec<S>,
    reservation: MemReservation,
    ctx: ExecContext,
}

impl<S> GroupStates<S> {
    pub fn new(ctx: &ExecContext) -> Self {
        Self {
            states: Vec::new(),
            reservation: ctx.reservation(),
            ctx: ctx.clone(),
        }
    }

    /// Grows the array to hold at least `len` states, filling new slots from
    /// `init`. No-op when already large enough.
    pub fn grow_to(
        &mut self,
        len: usize,
        mut init: impl FnMut(&ExecContext) -> S,
    ) -> Result<(), String> {
        if len <= self.states.len() {
            return Ok(());
        }
        let additional = len - self.states.len();
        self.reservation
            .try_grow(additional * std::mem::size_of::<S>())?;
        self.states.reserve(additional);
        while self.states.len() < len {
            self.states.push(init(&self.ctx));
        }
        Ok(())
    }

    pub fn get_mut(&mut self, ordinal: usize) -> &mut S {
        &mut self.states[ordinal]
    }

    pub fn as_slice(&self) -> &[S] {
        &self.states
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SumLongState {
    pub sum: i64,
    pub seen: bool,
}

impl SumLongState {
    pub fn add(&mut self, value: i64) -> Result<(), String> {
        self.sum = self
            .sum
            .checked_add(value)
            .ok_or_else(|| "long overflow in sum".to_string())?;
        self.seen = true;
        Ok(())
    }
}

/// Compensated double summation.
#[derive(Clone, Copy, Debug, Default)]
pub struct KahanSumState {
    pub value: f64,
    pub delta: f64,
    pub seen: bool,
}

impl KahanSumState {
    pub fn add(&mut self, value: f64) {
        self.add_with_delta(value, 0.0);
    }

    /// Neumaier-compensated add. A non-finite input is folded into the
    /// running value directly so infinities and NaN propagate the same way
    /// they would through a plain sum.
    pub fn add_with_delta(&mut self, value: f64, delta: f64) {
        self.seen = true;
        if !value.is_finite() {
            self.value += value;
            return;
        }
        if self.value.is_finite() {
            let corrected = value + (self.delta + delta);
            let updated = self.value + corrected;
            self.delta = corrected - (updated - self.value);
            self.value = updated;
        } else {
            self.value += value;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MinMaxState<E> {
    pub value: E,
    pub seen: bool,
}

/// Collected values of one group for the `values` aggregate. The only state
/// whose size is driven by the data, so every stored value is charged to the
/// task's memory reservation.
#[derive(Debug)]
pub struct ValuesState<E: Element> {
    values: Vec<E>,
    reservation: MemReservation,
}

impl<E: Element> ValuesState<E> {
    pub fn new(ctx: &ExecContext) -> Self {
        Self {
            values: Vec::new(),
            reservation: ctx.reservation(),
        }
    }

    /// Accounts the value (and any buffer growth) before storing it, so a
    /// memory limit breach surfaces as an error with nothing stored.
    pub fn try_push(&mut self, value: E) -> Result<(), String> {
        let heap = value.heap_bytes();
        if heap > 0 {
            self.reservation.try_grow(heap)?;
        }
        if self.values.len() == self.values.capacity() {
            let additional = self.values.capacity().max(4);
            self.reservation
                .try_grow(additional * std::mem::size_of::<E>())?;
            self.values.reserve_exact(additional);
        }
        self.values.push(value);
        Ok(())
    }

    pub fn values(&self) -> &[E] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value observed at the largest timestamp so far; `value` is `None` until
/// the first observation.
#[derive(Clone, Debug)]
pub struct LastOverTimeState<E> {
    pub timestamp: i64,
    pub value: Option<E>,
}

impl<E> Default for LastOverTimeState<E> {
    fn default() -> Self {
        Self {
            timestamp: 0,
            value: None,
        }
    }
}

impl<E: Clone> LastOverTimeState<E> {
    /// Strictly newer timestamps win; a tie keeps the incumbent, so the
    /// first value of a multi-valued row is the one retained.
    pub fn collect(&mut self, timestamp: i64, value: &E) {
        if self.value.is_none() || timestamp > self.timestamp {
            self.timestamp = timestamp;
            self.value = Some(value.clone());
        }
    }
}

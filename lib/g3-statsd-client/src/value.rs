/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025-2026 ByteDance and/or its affiliates.
 */

use std::fmt;

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Signed(i64),
    Unsigned(u64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Double(f) => *f,
            MetricValue::Signed(i) => *i as f64,
            MetricValue::Unsigned(u) => *u as f64,
        }
    }

    pub(crate) fn format_bytes(&self) -> SmallVec<[u8; 24]> {
        match self {
            MetricValue::Unsigned(u) => {
                let mut buffer = itoa::Buffer::new();
                SmallVec::from_slice(buffer.format(*u).as_bytes())
            }
            MetricValue::Signed(i) => {
                let mut buffer = itoa::Buffer::new();
                SmallVec::from_slice(buffer.format(*i).as_bytes())
            }
            MetricValue::Double(f) => {
                let mut buffer = ryu::Buffer::new();
                SmallVec::from_slice(buffer.format(*f).as_bytes())
            }
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(u) => itoa::Buffer::new().format(*u).fmt(f),
            MetricValue::Signed(i) => itoa::Buffer::new().format(*i).fmt(f),
            MetricValue::Double(v) => ryu::Buffer::new().format(*v).fmt(f),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for MetricValue {
                fn from(v: $t) -> Self {
                    MetricValue::Unsigned(v as u64)
                }
            }
        )*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for MetricValue {
                fn from(v: $t) -> Self {
                    MetricValue::Signed(v as i64)
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);
impl_from_signed!(i8, i16, i32, i64, isize);

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Double(v as f64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Double(v)
    }
}

//! Synthetic traced workload.

use std::hint::black_box;

use scopetrace::{trace_scope, Tracer};

/// Run one task: chains of nested regions up to `depth` levels deep.
pub fn run_task(tracer: &Tracer, task: usize, depth: u32) -> f32 {
    trace_scope!(tracer; "task", "demo");
    let mut sum = 0.0;
    for level in 0..=depth {
        sum += nested(tracer, level, task);
    }
    sum
}

fn nested(tracer: &Tracer, level: u32, seed: usize) -> f32 {
    trace_scope!(tracer; "nested", "demo");
    if level == 0 {
        return accumulate(tracer, seed);
    }
    nested(tracer, level - 1, seed) + 1.0
}

fn accumulate(tracer: &Tracer, seed: usize) -> f32 {
    trace_scope!(tracer; "accumulate", "demo,compute");
    let offset = u16::try_from(seed % 7).unwrap_or(0);
    let mut sum = 0.0_f32;
    for i in 0..10_000_u16 {
        sum += black_box(2.0) * f32::from((i + offset) % 7);
    }
    sum
}

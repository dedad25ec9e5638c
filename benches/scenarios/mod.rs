//! Real-world scenario benchmarks.
//!
//! Scheduling cost in the control domain and render cost of the built-in
//! effects in the render domain.

mod effects;

pub use effects::{bench_render, bench_schedule};

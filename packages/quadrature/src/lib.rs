#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Numerical workloads that split a computation into independent tasks for a
//! [`task_pool::Pool`].
//!
//! * [`IntegralTask`] and [`partition()`] - trapezoidal integration of a function over a range,
//!   optionally split into equal sub-ranges.
//! * [`Strategy`] - interchangeable ways of executing the sub-range integrations: on the
//!   calling thread, on a pool, on one thread per sub-range or on a fixed set of threads
//!   sharing an atomic work index. Each strategy is a plain closure selected at the call site.
//! * [`MatrixVector`] - a dense matrix-vector product in row-major or column-major
//!   [`Layout`], split into blocks of rows or columns ([`Decomposition`]).
//!
//! # Example
//!
//! ```
//! use std::f64::consts::PI;
//! use std::num::NonZero;
//!
//! use quadrature::{partition, pooled, sequential};
//! use task_pool::Pool;
//!
//! let pool = Pool::new(4).unwrap();
//! let tasks = partition(0.0, PI, 1e-4, NonZero::new(30).unwrap(), f64::sin).unwrap();
//!
//! let parallel = pooled(&pool, &tasks).unwrap();
//! let reference = sequential(&tasks);
//!
//! assert!((parallel - reference).abs() <= 1e-9 * reference.abs());
//! ```

mod error;
mod integral;
mod matrix;
mod strategy;

pub use error::*;
pub use integral::*;
pub use matrix::*;
pub use strategy::*;

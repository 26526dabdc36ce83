// Copyright (c) 2026 graycv contributors
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT
// See the LICENSE file at the repository root.
// src/core/mod.rs

//! Pipelines composed from the `cv` and `features` building blocks.

pub mod scanner;

pub use scanner::{Quad, QuadScanner, ScannerOptions};

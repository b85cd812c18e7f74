//! # BoostMD Core Library
//!
//! A library for driving long-running, bias-accelerated molecular dynamics
//! simulations forward in fixed-size chunks, with exact checkpoint/restart
//! semantics and an append-only per-chunk energy log.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction:
//!
//! - **[`engine`]: The Physics Boundary.** Defines the capability interface
//!   ([`engine::SimulationEngine`]) the runner consumes (advance by N steps,
//!   read energy/boost diagnostics, serialize/restore state), together with
//!   the closed set of boost variants and a deterministic reference
//!   implementation. Everything numerically interesting happens behind this
//!   trait; the runner treats it as an opaque, possibly-failing black box.
//!
//! - **[`runner`]: The Execution Core.** Orchestrates a complete staged run:
//!   chunked stepping, stage bookkeeping, rolling-checkpoint persistence,
//!   step-indexed snapshots, and the `gamd.log` append discipline that lets a
//!   run survive arbitrary interruption and resume without losing or
//!   duplicating a single log line.

pub mod engine;
pub mod runner;

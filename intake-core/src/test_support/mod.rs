// SPDX-License-Identifier: Apache-2.0

//! Shared test scaffolding, colocated the way the teacher keeps `test_dag_builder.rs` alongside
//! the production code it exercises. Only compiled for tests.

pub mod event_factory;

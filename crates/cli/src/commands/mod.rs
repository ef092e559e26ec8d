// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cancel;
pub mod list;
pub mod result;
pub mod status;
pub mod submit;

#[cfg(test)]
pub(crate) mod test_context;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context over fake adapters and a temporary commissioning tree

use mc_adapters::{FakeProcesses, FakeScheduler};
use mc_engine::test_support::install_commissioning;
use std::path::Path;

use crate::context::Context;

pub type FakeContext = Context<FakeScheduler, FakeProcesses>;

pub struct TestEnv {
    pub tmp: tempfile::TempDir,
    pub scheduler: FakeScheduler,
    pub processes: FakeProcesses,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            tmp: tempfile::tempdir().unwrap(),
            scheduler: FakeScheduler::new(),
            processes: FakeProcesses::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// A fresh context; its registry is recovered from the jobs directory.
    pub fn context(&self) -> FakeContext {
        let config = install_commissioning(self.root()).unwrap();
        Context::new(
            config,
            self.root().join("config.toml"),
            self.scheduler.clone(),
            self.processes.clone(),
        )
        .unwrap()
    }
}

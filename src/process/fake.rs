//! Scripted [`CommandRunner`] for flow-level tests

use async_trait::async_trait;
use std::sync::Mutex;

use super::{CommandOutput, CommandRunner, CommandSpec, ProcessHandle};
use crate::utils::BootstrapError;

type Handler =
    Box<dyn Fn(&CommandSpec, usize) -> Result<CommandOutput, BootstrapError> + Send + Sync>;

/// Answers every command through a handler and records what was asked
///
/// The handler also receives how many times the same program and first
/// argument were seen before, so a check can fail first and succeed later.
pub struct FakeRunner {
    handler: Handler,
    calls: Mutex<Vec<CommandSpec>>,
    spawned: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandSpec, usize) -> Result<CommandOutput, BootstrapError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            spawned: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn count(&self, program: &str, first_arg: Option<&str>) -> usize {
        self.calls()
            .iter()
            .filter(|spec| spec.is(program, first_arg))
            .count()
    }
}

pub fn missing(spec: &CommandSpec) -> Result<CommandOutput, BootstrapError> {
    Err(BootstrapError::MissingTool {
        tool: spec.program.clone(),
    })
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, BootstrapError> {
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            let seen = calls
                .iter()
                .filter(|c| c.program == spec.program && c.args.first() == spec.args.first())
                .count();
            calls.push(spec.clone());
            seen
        };
        (self.handler)(spec, seen)
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<ProcessHandle, BootstrapError> {
        self.spawned.lock().unwrap().push(spec.clone());
        Ok(ProcessHandle::untracked(spec.to_string()))
    }
}

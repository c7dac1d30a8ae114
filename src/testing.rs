//! Test doubles for the process seam.
//!
//! [`ScriptedRunner`] replays canned [`CommandOutput`]s in order and records
//! every invocation, so `gh`/`git` interactions can be asserted without
//! touching the network or a real repository.

use crate::error::{AnokyeError, Result};
use crate::github::runner::{CommandOutput, CommandRunner};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Record of one process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl RecordedCall {
    /// Program and arguments joined with spaces, for readable assertions.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<VecDeque<CommandOutput>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with the given stdout.
    pub fn push_ok(&self, stdout: impl Into<String>) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(CommandOutput::ok(stdout));
        self
    }

    /// Queue a failing response.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(CommandOutput::failed(code, stderr));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<CommandOutput> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            stdin: stdin.map(str::to_string),
        };
        let line = call.command_line();
        self.calls.borrow_mut().push(call);
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| AnokyeError::NotFound(format!("no scripted response for `{}`", line)))
    }
}

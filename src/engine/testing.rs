//! Scripted engine double for unit tests.
//!
//! Records every call in order and answers `execute` from substring rules.
//! Statements with no matching rule succeed with an empty output.

use super::{Connection, Engine, QueryOutput};
use crate::error::{QuarryError, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Register(String),
    Execute(String),
}

enum Reply {
    Rows(QueryOutput),
    Fail(String),
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    rules: Vec<(String, Reply)>,
    open: usize,
    opened: usize,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedEngine {
    script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `needle` with `output`.
    pub(crate) fn respond(&self, needle: &str, output: QueryOutput) {
        self.script
            .borrow_mut()
            .rules
            .push((needle.to_string(), Reply::Rows(output)));
    }

    /// Fail statements containing `needle`.
    pub(crate) fn fail_on(&self, needle: &str, message: &str) {
        self.script
            .borrow_mut()
            .rules
            .push((needle.to_string(), Reply::Fail(message.to_string())));
    }

    /// Answer `DESCRIBE "<relation>"` with the given (name, type) columns.
    pub(crate) fn describe(&self, relation: &str, columns: &[(&str, &str)]) {
        let rows = columns
            .iter()
            .map(|(n, t)| vec![Value::from(*n), Value::from(*t), Value::from("YES")])
            .collect();
        self.respond(
            &format!("DESCRIBE \"{}\"", relation),
            QueryOutput::new(
                vec![
                    "column_name".to_string(),
                    "column_type".to_string(),
                    "null".to_string(),
                ],
                rows,
            ),
        );
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.script.borrow().calls.clone()
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(sql) => Some(sql),
                Call::Register(_) => None,
            })
            .collect()
    }

    pub(crate) fn registered(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Register(path) => Some(path),
                Call::Execute(_) => None,
            })
            .collect()
    }

    pub(crate) fn open_connections(&self) -> usize {
        self.script.borrow().open
    }

    pub(crate) fn connections_opened(&self) -> usize {
        self.script.borrow().opened
    }
}

impl Engine for ScriptedEngine {
    fn connect(&self) -> Result<Box<dyn Connection + '_>> {
        let mut script = self.script.borrow_mut();
        script.open += 1;
        script.opened += 1;
        Ok(Box::new(ScriptedConnection {
            script: Rc::clone(&self.script),
        }))
    }
}

struct ScriptedConnection {
    script: Rc<RefCell<Script>>,
}

impl Connection for ScriptedConnection {
    fn register_bytes(&self, path: &str, _bytes: &[u8]) -> Result<()> {
        self.script
            .borrow_mut()
            .calls
            .push(Call::Register(path.to_string()));
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<QueryOutput> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::Execute(sql.to_string()));
        let reply = script
            .rules
            .iter()
            .rev()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, reply)| reply);
        match reply {
            Some(Reply::Rows(output)) => Ok(output.clone()),
            Some(Reply::Fail(message)) => Err(QuarryError::Engine(message.clone())),
            None => Ok(QueryOutput::default()),
        }
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.script.borrow_mut().open -= 1;
    }
}

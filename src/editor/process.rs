//! [`RecordEditor`] backed by an external helper process.
//!
//! The helper is spawned once per session and speaks one JSON object per
//! line over its stdin/stdout. Every request carries an `op` field; every
//! reply carries `ok`, plus either the requested values or an `error`
//! message:
//!
//! ```text
//! -> {"op":"open","path":"/game/globalgamemanagers.temp","kind":"asset"}
//! <- {"ok":true,"scratch":["/game/globalgamemanagers.temp.unpacked"]}
//! -> {"op":"locate","class":"BuildSettings"}
//! <- {"ok":true,"record":11}
//! -> {"op":"base_fields","record":11}
//! <- {"ok":true,"fields":1}
//! -> {"op":"read_bool","fields":1,"name":"hasPROVersion"}
//! <- {"ok":true,"value":false}
//! -> {"op":"locate","class":"Shader"}
//! <- {"ok":false,"error":"class Shader not found"}
//! ```
//!
//! Error replies become [`Error::MutationUnsupported`]; a helper that dies
//! or answers with something that is not a reply becomes [`Error::Editor`].

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{Value, json};

use super::{ArrayElement, RecordClass, RecordEditor, RecordKind};
use crate::{Error, Result};

/// Record handle issued by the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteRecord(pub u64);

/// Field tree handle issued by the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFields(pub u64);

/// Committed change handle issued by the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteReplacer(pub u64);

/// Record editor that drives a helper program over JSON lines.
pub struct ProcessEditor {
    program: PathBuf,
    args: Vec<OsString>,
    session: Option<Session>,
    scratch: Vec<PathBuf>,
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl std::fmt::Debug for ProcessEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessEditor")
            .field("program", &self.program)
            .field("running", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl ProcessEditor {
    /// Creates an editor that runs `program` for each session.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            session: None,
            scratch: Vec::new(),
        }
    }

    /// Adds arguments passed to the helper on spawn.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the helper program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn(&mut self) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::Editor(format!(
                    "cannot start record editor {}: {e}",
                    self.program.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Editor("record editor stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Editor("record editor stdout unavailable".into()))?;

        log::debug!("started record editor {}", self.program.display());
        self.session = Some(Session {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// Sends one request and returns the successful reply.
    fn call(&mut self, request: Value) -> Result<Value> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Editor("no record file is open".into()))?;

        let op = request["op"].as_str().unwrap_or("?").to_string();
        let mut line = request.to_string();
        line.push('\n');
        session
            .stdin
            .write_all(line.as_bytes())
            .and_then(|_| session.stdin.flush())
            .map_err(|e| Error::Editor(format!("{op}: cannot write request: {e}")))?;

        let mut reply = String::new();
        let read = session
            .stdout
            .read_line(&mut reply)
            .map_err(|e| Error::Editor(format!("{op}: cannot read reply: {e}")))?;
        if read == 0 {
            return Err(Error::Editor(format!("{op}: record editor exited")));
        }

        let reply: Value = serde_json::from_str(reply.trim_end())
            .map_err(|e| Error::Editor(format!("{op}: malformed reply: {e}")))?;
        match reply["ok"].as_bool() {
            Some(true) => Ok(reply),
            Some(false) => Err(Error::MutationUnsupported {
                reason: reply["error"]
                    .as_str()
                    .unwrap_or("record editor reported an error")
                    .to_string(),
            }),
            None => Err(Error::Editor(format!("{op}: reply has no \"ok\" field"))),
        }
    }
}

fn field_u64(reply: &Value, key: &str) -> Result<u64> {
    reply[key]
        .as_u64()
        .ok_or_else(|| Error::Editor(format!("reply is missing integer field \"{key}\"")))
}

fn field_bool(reply: &Value, key: &str) -> Result<bool> {
    reply[key]
        .as_bool()
        .ok_or_else(|| Error::Editor(format!("reply is missing boolean field \"{key}\"")))
}

fn parse_elements(reply: &Value) -> Result<Vec<ArrayElement>> {
    let items = reply["elements"]
        .as_array()
        .ok_or_else(|| Error::Editor("reply is missing array field \"elements\"".into()))?;
    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let index = item["index"].as_u64().unwrap_or(position as u64) as usize;
            Ok(ArrayElement {
                index,
                name: item["name"].as_str().map(str::to_string),
            })
        })
        .collect()
}

impl RecordEditor for ProcessEditor {
    type Record = RemoteRecord;
    type Fields = RemoteFields;
    type Replacer = RemoteReplacer;

    fn open(&mut self, source: &Path, kind: RecordKind) -> Result<()> {
        if self.session.is_some() {
            self.close();
        }
        self.spawn()?;
        let reply = self.call(json!({
            "op": "open",
            "path": source.to_string_lossy(),
            "kind": kind.name(),
        }))?;
        if let Some(paths) = reply["scratch"].as_array() {
            self.scratch
                .extend(paths.iter().filter_map(Value::as_str).map(PathBuf::from));
        }
        Ok(())
    }

    fn locate(&mut self, class: RecordClass) -> Result<RemoteRecord> {
        let reply = self.call(json!({ "op": "locate", "class": class.name() }))?;
        field_u64(&reply, "record").map(RemoteRecord)
    }

    fn base_fields(&mut self, record: &RemoteRecord) -> Result<RemoteFields> {
        let reply = self.call(json!({ "op": "base_fields", "record": record.0 }))?;
        field_u64(&reply, "fields").map(RemoteFields)
    }

    fn read_bool(&mut self, fields: &RemoteFields, name: &str) -> Result<bool> {
        let reply = self.call(json!({ "op": "read_bool", "fields": fields.0, "name": name }))?;
        field_bool(&reply, "value")
    }

    fn write_bool(&mut self, fields: &mut RemoteFields, name: &str, value: bool) -> Result<()> {
        self.call(json!({
            "op": "write_bool",
            "fields": fields.0,
            "name": name,
            "value": value,
        }))?;
        Ok(())
    }

    fn array_elements(&mut self, fields: &RemoteFields, name: &str) -> Result<Vec<ArrayElement>> {
        let reply = self.call(json!({
            "op": "array_elements",
            "fields": fields.0,
            "name": name,
        }))?;
        parse_elements(&reply)
    }

    fn remove_array_element(
        &mut self,
        fields: &mut RemoteFields,
        name: &str,
        index: usize,
    ) -> Result<()> {
        self.call(json!({
            "op": "remove_array_element",
            "fields": fields.0,
            "name": name,
            "index": index,
        }))?;
        Ok(())
    }

    fn commit(&mut self, record: &RemoteRecord, fields: RemoteFields) -> Result<RemoteReplacer> {
        let reply = self.call(json!({
            "op": "commit",
            "record": record.0,
            "fields": fields.0,
        }))?;
        field_u64(&reply, "replacer").map(RemoteReplacer)
    }

    fn write_changes(&mut self, dest: &Path, replacers: Vec<RemoteReplacer>) -> Result<()> {
        let ids: Vec<u64> = replacers.iter().map(|r| r.0).collect();
        self.call(json!({
            "op": "write_changes",
            "path": dest.to_string_lossy(),
            "replacers": ids,
        }))?;
        Ok(())
    }

    fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let _ = writeln!(session.stdin, "{}", json!({ "op": "close" }));
        drop(session.stdin);
        match session.child.wait() {
            Ok(status) if !status.success() => {
                log::warn!("record editor exited with {status}");
            }
            Ok(_) => log::debug!("record editor closed"),
            Err(e) => log::warn!("waiting for record editor failed: {e}"),
        }
    }

    fn take_scratch_paths(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.scratch)
    }
}

impl Drop for ProcessEditor {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let _ = session.child.kill();
            let _ = session.child.wait();
        }
    }
}

//! Script units
//!
//! A script unit starts with a shebang line naming the command that runs it,
//! for example `#!/bin/sh -s` or `#!/usr/bin/env python3 -`. The command must
//! read its program from stdin: invocation spawns the command with the
//! original arguments appended and pipes the unit to it, so the script is
//! never written to disk.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{NestError, Result};
use crate::unit::{Invokable, UnitDefiner};

/// Environment variable carrying the unit name to the interpreter
pub const UNIT_NAME_ENV: &str = "NESTRUN_UNIT";

/// Environment variable carrying the unit origin to the interpreter
pub const UNIT_ORIGIN_ENV: &str = "NESTRUN_ORIGIN";

/// A script unit ready to run
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    name: String,
    origin: String,
    /// Interpreter command and its leading arguments
    interpreter: Vec<String>,
    /// The whole unit, shebang included
    source: Vec<u8>,
}

impl ScriptUnit {
    /// Parse unit bytes, requiring a non-empty shebang line
    pub fn parse(name: &str, origin: &str, source: Vec<u8>) -> Result<Self> {
        let malformed = |reason: &str| NestError::UnitMalformed {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let first_line = source.split(|b| *b == b'\n').next().unwrap_or_default();
        let first_line = std::str::from_utf8(first_line)
            .map_err(|_| malformed("shebang line is not valid UTF-8"))?;
        let command = first_line
            .strip_prefix("#!")
            .ok_or_else(|| malformed("missing shebang line"))?;

        let interpreter: Vec<String> = command.split_whitespace().map(String::from).collect();
        if interpreter.is_empty() {
            return Err(malformed("shebang names no interpreter"));
        }

        Ok(Self {
            name: name.to_string(),
            origin: origin.to_string(),
            interpreter,
            source,
        })
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Invokable for ScriptUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: &[String]) -> Result<()> {
        info!("starting {} from {}", self.name, self.origin);
        debug!("interpreter: {:?}, {} argument(s)", self.interpreter, args.len());

        let mut child = Command::new(&self.interpreter[0])
            .args(&self.interpreter[1..])
            .args(args)
            .env(UNIT_NAME_ENV, &self.name)
            .env(UNIT_ORIGIN_ENV, &self.origin)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| NestError::UnitMalformed {
                name: self.name.clone(),
                reason: format!("cannot start '{}': {}", self.interpreter[0], e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // an interpreter may exit before reading everything
            match stdin.write_all(&self.source) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(NestError::EntryPointFailed {
                name: self.name.clone(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Defines every unit as a script
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDefiner;

impl UnitDefiner for ScriptDefiner {
    fn define(&self, name: &str, origin: &str, bytes: Vec<u8>) -> Result<Arc<dyn Invokable>> {
        Ok(Arc::new(ScriptUnit::parse(name, origin, bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_shebang() {
        let unit = ScriptUnit::parse("a.B", "x.zip!/a/B.unit", b"#!/usr/bin/env python3 -\nprint(1)\n".to_vec()).unwrap();
        assert_eq!(unit.interpreter(), &["/usr/bin/env", "python3", "-"]);
        assert_eq!(unit.name(), "a.B");
        assert_eq!(unit.origin(), "x.zip!/a/B.unit");
    }

    #[test]
    fn test_parse_missing_shebang() {
        let err = ScriptUnit::parse("a.B", "", b"echo hi\n".to_vec()).unwrap_err();
        assert!(matches!(err, NestError::UnitMalformed { .. }));
    }

    #[test]
    fn test_parse_empty_shebang() {
        let err = ScriptUnit::parse("a.B", "", b"#!   \necho hi\n".to_vec()).unwrap_err();
        assert!(matches!(err, NestError::UnitMalformed { .. }));
    }

    #[test]
    fn test_parse_empty_unit() {
        assert!(ScriptUnit::parse("a.B", "", Vec::new()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_passes_args() {
        let source = b"#!/bin/sh -s\n[ \"$1\" = a ] && [ \"$2\" = 'b c' ] && [ \"$NESTRUN_UNIT\" = t.Args ] && exit 0\nexit 3\n";
        let unit = ScriptDefiner.define("t.Args", "test", source.to_vec()).unwrap();

        unit.invoke(&args(&["a", "b c"])).unwrap();

        match unit.invoke(&args(&["x"])) {
            Err(NestError::EntryPointFailed { status, .. }) => assert_eq!(status, 3),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_missing_interpreter() {
        let unit = ScriptDefiner
            .define("t.Gone", "test", b"#!/nonexistent/interpreter\n".to_vec())
            .unwrap();
        assert!(matches!(unit.invoke(&[]), Err(NestError::UnitMalformed { .. })));
    }
}

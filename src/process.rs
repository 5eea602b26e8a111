//! Boundary with external programs.
//!
//! An [Invocation] is a program, its arguments, an optional working directory and the file(s) it is
//! expected to write. It is executed by a [ProcessLauncher] which captures exit status and outputs,
//! so that failures can be detected by [inspect] instead of being lost.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::RbhError;
use crate::tasks::{ExecutionPhase, FailureReason, TaskFailure};

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    workdir: Option<PathBuf>,
    /// any of these files shows the invocation did its job
    produces: Vec<PathBuf>,
}

impl Invocation {
    pub fn new(program: &Path) -> Self {
        Invocation {
            program: program.to_path_buf(),
            args: Vec::new(),
            workdir: None,
            produces: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn workdir(mut self, dir: &Path) -> Self {
        self.workdir = Some(dir.to_path_buf());
        self
    }

    /// declares a file the invocation is expected to write
    pub fn produces(mut self, path: &Path) -> Self {
        self.produces.push(path.to_path_buf());
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    pub fn get_produced(&self) -> &[PathBuf] {
        &self.produces
    }

    /// command line as a shell would show it, for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// removes expected files left by a previous run, so that only this run can satisfy [Self::missing_output]
    pub fn clear_outputs(&self) -> io::Result<()> {
        for path in &self.produces {
            match std::fs::remove_file(path) {
                Ok(()) => log::debug!("removed previous output {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// returns the first expected file if none of them exists
    pub fn missing_output(&self) -> Option<&Path> {
        if self.produces.iter().any(|p| p.exists()) {
            return None;
        }
        self.produces.first().map(|p| p.as_path())
    }
} // end of impl Invocation

//==========================================================================================

/// What we get back from a finished process
#[derive(Debug, Clone, Default)]
pub struct InvocationOutput {
    code: Option<i32>,
    success: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl InvocationOutput {
    pub fn new(code: Option<i32>, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        InvocationOutput {
            code,
            success: code == Some(0),
            stdout,
            stderr,
        }
    }

    /// exit code, None if process was killed by a signal
    pub fn get_code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn get_stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

impl From<std::process::Output> for InvocationOutput {
    fn from(output: std::process::Output) -> Self {
        InvocationOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs an invocation to completion. The call blocks the worker for the whole run of the process.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, invocation: &Invocation) -> io::Result<InvocationOutput>;
}

/// launcher spawning real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, invocation: &Invocation) -> io::Result<InvocationOutput> {
        let mut cmd = Command::new(invocation.get_program());
        cmd.args(invocation.get_args());
        if let Some(dir) = invocation.get_workdir() {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;
        Ok(InvocationOutput::from(output))
    }
}

/// resolves the aligner name (or path) to an executable, fatal if it is not there.
pub fn locate_tool(tool: &str) -> Result<PathBuf, RbhError> {
    let path = which::which(tool).map_err(|source| RbhError::ToolNotFound {
        tool: tool.to_string(),
        source,
    })?;
    log::debug!("using {} at {:?}", tool, path);
    Ok(path)
}

/// converts the result of a launch into a failure, if any.
pub fn inspect(
    phase: ExecutionPhase,
    task: &str,
    invocation: &Invocation,
    result: io::Result<InvocationOutput>,
) -> Option<TaskFailure> {
    let reason = match result {
        Err(e) => FailureReason::Launch(e.to_string()),
        Ok(output) if !output.success() => FailureReason::ExitStatus {
            code: output.get_code(),
            stderr: output.stderr_text(),
        },
        Ok(_) => match invocation.missing_output() {
            Some(path) => FailureReason::MissingOutput(path.to_path_buf()),
            None => return None,
        },
    };
    Some(TaskFailure {
        phase,
        task: task.to_string(),
        command: invocation.command_line(),
        reason,
    })
} // end of inspect

//==========================================================================================

// end of mod tests

use crate::agent::binaries::{select_provider, AgentBinaries};
use crate::agent::invocation::build_agent_invocation;
use crate::agent::output_parse::parse_agent_stdout;
use crate::agent::prompt_files::{instruction_pointer, write_instruction_file};
use crate::agent::{io_error, AgentError};
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub instruction: String,
    pub cwd: PathBuf,
    pub timeout: Duration,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub success: bool,
    pub output: String,
    pub cost: f64,
    pub provider: String,
}

/// Seam between the orchestrators and the agent subprocess machinery.
pub trait TaskRunner {
    fn run_task(&self, request: &TaskRequest) -> Result<TaskOutcome, AgentError>;
}

/// Production runner: probes installed CLIs and drives one as a child
/// process under a wall-clock timeout.
#[derive(Debug, Clone, Default)]
pub struct CliTaskRunner {
    pub binaries: AgentBinaries,
}

impl CliTaskRunner {
    pub fn new(binaries: AgentBinaries) -> Self {
        Self { binaries }
    }
}

impl TaskRunner for CliTaskRunner {
    fn run_task(&self, request: &TaskRequest) -> Result<TaskOutcome, AgentError> {
        let resolved = select_provider(&self.binaries)?;
        let instruction_file =
            write_instruction_file(&request.cwd, &request.label, &request.instruction)?;
        let invocation = build_agent_invocation(
            resolved.provider,
            &resolved.binary,
            &instruction_pointer(&instruction_file),
        );

        let mut command = Command::new(&invocation.binary);
        command
            .current_dir(&request.cwd)
            .args(&invocation.args)
            .stdin(if invocation.stdin_payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|err| io_error(&invocation.binary, err))?;

        if let Some(payload) = invocation.stdin_payload {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| io_error(&request.cwd, std::io::Error::other("missing stdin pipe")))?;
            // Written from a thread so a child that never reads stdin
            // cannot deadlock the parent.
            thread::spawn(move || {
                let _ = stdin.write_all(payload.as_bytes());
            });
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(&request.cwd, std::io::Error::other("missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(&request.cwd, std::io::Error::other("missing stderr pipe")))?;

        let stdout_reader = thread::spawn(move || {
            let mut buf = String::new();
            let mut reader = BufReader::new(stdout);
            let _ = reader.read_to_string(&mut buf);
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut buf);
            buf
        });

        let start = Instant::now();
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > request.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        // Reader threads are left to drain on their own; a
                        // grandchild holding the pipe open must not block
                        // the timeout report.
                        return Err(AgentError::Timeout {
                            provider: resolved.provider,
                            timeout_ms: request.timeout.as_millis() as u64,
                        });
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(io_error(&request.cwd, err)),
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !exit_status.success() {
            return Err(AgentError::NonZeroExit {
                provider: resolved.provider,
                exit_code: exit_status.code().unwrap_or(-1),
                stderr,
            });
        }

        let parsed = parse_agent_stdout(resolved.provider, &stdout)?;
        Ok(TaskOutcome {
            success: parsed.success,
            output: parsed.content,
            cost: parsed.cost,
            provider: resolved.provider.to_string(),
        })
    }
}

//! Azure CLI command execution.
//!
//! Provides utilities for running `az` commands and parsing their JSON output.

use crate::config;
use crate::error::AzureError;
use colored::Colorize;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::process::Command;
use std::sync::OnceLock;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Quote an argument so it survives [`split_and_strip`] as one token.
pub fn quote(arg: &str) -> String {
    if arg.contains('\'') {
        format!("\"{arg}\"")
    } else {
        format!("'{arg}'")
    }
}

/// Run an `az` command line and return its stdout.
///
/// `cmd` is everything after `az`; quoted substrings stay one argument.
pub fn run(cmd: &str) -> Result<String, AzureError> {
    let full = format!("az {cmd}");
    log::debug!("run({cmd})", cmd = full.on_blue());

    let args = split_and_strip(cmd);
    log::trace!("split args={:?}", args);

    let output = Command::new(config::AZ_BINARY)
        .args(&args)
        .output()
        .map_err(|e| {
            log::error!("Command execution failed: {}", e);
            AzureError::Spawn {
                cmd: full.clone(),
                source: e,
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = full.on_blue()
        );
        return Err(AzureError::Command {
            cmd: full,
            code: output.status.code(),
            stderr,
        });
    }

    log::debug!("Success output.stdout.len(): {}", output.stdout.len());
    if output.stdout.len() > config::MAX_RESPONSE_BYTES {
        return Err(AzureError::ResponseTooLarge {
            cmd: full,
            len: output.stdout.len(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| AzureError::Utf8 { cmd: full })
}

/// Run an `az` command with `--output json` and deserialize the result.
pub fn run_json<T: DeserializeOwned>(cmd: &str, what: &str) -> Result<T, AzureError> {
    let output = run(&format!("{cmd} --output json"))?;
    parse_json(&output, what)
}

/// Deserialize `az` JSON output, reporting the JSON path on failure.
pub fn parse_json<T: DeserializeOwned>(output: &str, what: &str) -> Result<T, AzureError> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        AzureError::parse(what, e)
    })
}

/// True when a failed `az` call means the resource does not exist.
pub fn is_not_found(err: &AzureError) -> bool {
    match err {
        AzureError::Command { stderr, .. } => {
            stderr.contains("ResourceNotFound")
                || stderr.contains("ResourceGroupNotFound")
                || stderr.contains("was not found")
        }
        _ => false,
    }
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .filter(|s| !s.is_empty())
        .collect()
}

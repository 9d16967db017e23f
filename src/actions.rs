//! GitHub Actions workflow commands: step outputs and failure annotations.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::env::EnvSource;

/// Escape a workflow command message (`%`, `\r`, `\n`).
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Append one output to the `GITHUB_OUTPUT` file. Multi-line values use the
/// heredoc form.
pub fn write_output_file(path: &Path, name: &str, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", std::process::id());
        if value.contains(&delimiter) || name.contains(&delimiter) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("output '{name}' contains the delimiter {delimiter}"),
            ));
        }
        writeln!(file, "{name}<<{delimiter}\n{value}\n{delimiter}")
    } else {
        writeln!(file, "{name}={value}")
    }
}

/// Set a step output, falling back to the legacy stdout command when the
/// runner does not provide `GITHUB_OUTPUT`.
pub fn set_output(env: &dyn EnvSource, name: &str, value: &str) -> io::Result<()> {
    match env.var("GITHUB_OUTPUT").filter(|p| !p.is_empty()) {
        Some(path) => write_output_file(Path::new(&path), name, value),
        None => {
            println!(
                "::set-output name={}::{}",
                escape_property(name),
                escape_data(value)
            );
            Ok(())
        }
    }
}

/// Workflow command that records `message` as an error annotation.
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Emit an error annotation.
pub fn error(message: &str) {
    println!("{}", error_command(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("HTTP 500: oops\nbody 100%"), "HTTP 500: oops%0Abody 100%25");
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }

    #[test]
    fn test_error_command() {
        assert_eq!(
            error_command("Map init failed: bad schema"),
            "::error::Map init failed: bad schema"
        );
        assert_eq!(error_command("HTTP 500: x\ny"), "::error::HTTP 500: x%0Ay");
    }

    #[test]
    fn test_write_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");

        write_output_file(&path, "build-hash", "abc123").unwrap();
        write_output_file(&path, "scene-key", "k1").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "build-hash=abc123\nscene-key=k1\n");
    }

    #[test]
    fn test_write_multiline_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");

        write_output_file(&path, "note", "one\ntwo").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let delimiter = format!("ghadelimiter_{}", std::process::id());
        assert_eq!(content, format!("note<<{delimiter}\none\ntwo\n{delimiter}\n"));
    }

    #[test]
    fn test_set_output_uses_github_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        let env: std::collections::HashMap<String, String> = [(
            "GITHUB_OUTPUT".to_string(),
            path.to_str().unwrap().to_string(),
        )]
        .into_iter()
        .collect();

        set_output(&env, "build-hash", "h").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "build-hash=h\n");
    }
}

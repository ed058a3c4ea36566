// src/exec/command.rs

//! Turning a rendered command line into an argument vector.

use crate::errors::InvokeError;

/// Split `command` the way a POSIX shell would split words: quotes group,
/// backslashes escape. Nothing is expanded.
pub fn parse_command(command: &str) -> Result<Vec<String>, InvokeError> {
    let argv = shell_words::split(command)?;
    if argv.is_empty() {
        return Err(InvokeError::EmptyCommand);
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_arguments_stay_together() {
        let argv = parse_command(r#"python "my file.py" --flag"#).unwrap();
        assert_eq!(argv, vec!["python", "my file.py", "--flag"]);
    }

    #[test]
    fn single_quotes_and_escapes() {
        let argv = parse_command(r"echo 'a b' c\ d").unwrap();
        assert_eq!(argv, vec!["echo", "a b", "c d"]);
    }

    #[test]
    fn malformed_and_empty_strings_fail() {
        assert!(matches!(parse_command("echo \"oops"), Err(InvokeError::Parse(_))));
        assert!(matches!(parse_command("   "), Err(InvokeError::EmptyCommand)));
    }
}

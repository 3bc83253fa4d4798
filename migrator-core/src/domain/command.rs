//! External command template and its rendered invocation

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Substitution point for the migration file path
pub const PATH_PLACEHOLDER: &str = "%s";

/// How to invoke the database client for one migration file
///
/// In settings files this is either a plain string (`Literal`) or an object
/// with `program` and `args` (`Structured`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandTemplate {
    /// A single string such as `psql -d app -f %s`.
    ///
    /// After substitution the string is split on whitespace, so no argument
    /// (including the path) may contain a space.
    Literal(String),
    /// Program plus argument vector; exactly one argument contains `%s`.
    /// Nothing is re-split, so spaces inside arguments are preserved.
    Structured { program: String, args: Vec<String> },
}

impl Default for CommandTemplate {
    fn default() -> Self {
        CommandTemplate::Literal(String::new())
    }
}

impl CommandTemplate {
    pub fn is_empty(&self) -> bool {
        match self {
            CommandTemplate::Literal(s) => s.trim().is_empty(),
            CommandTemplate::Structured { program, .. } => program.trim().is_empty(),
        }
    }

    /// Check the template has exactly one path placeholder
    pub fn validate(&self) -> Result<()> {
        let count = match self {
            CommandTemplate::Literal(s) => s.matches(PATH_PLACEHOLDER).count(),
            CommandTemplate::Structured { program, args } => {
                if program.contains(PATH_PLACEHOLDER) {
                    return Err(Error::config(format!(
                        "the program name must not contain {}",
                        PATH_PLACEHOLDER
                    )));
                }
                args.iter()
                    .map(|a| a.matches(PATH_PLACEHOLDER).count())
                    .sum()
            }
        };

        if count != 1 {
            return Err(Error::config(format!(
                "command must contain exactly one {} placeholder, found {}",
                PATH_PLACEHOLDER, count
            )));
        }
        Ok(())
    }

    /// Substitute `path` and split into program and arguments
    pub fn render(&self, path: &Path) -> Result<Invocation> {
        let path = path.to_string_lossy();

        match self {
            CommandTemplate::Literal(template) => {
                let command = template.replacen(PATH_PLACEHOLDER, &path, 1);
                let mut tokens = command.split_whitespace().map(str::to_string);
                let program = tokens.next();
                let args: Vec<String> = tokens.collect();

                match program {
                    Some(program) if !args.is_empty() => Ok(Invocation { program, args }),
                    _ => Err(Error::config("command is too short")),
                }
            }
            CommandTemplate::Structured { program, args } => Ok(Invocation {
                program: program.clone(),
                args: args
                    .iter()
                    .map(|a| a.replacen(PATH_PLACEHOLDER, &path, 1))
                    .collect(),
            }),
        }
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandTemplate::Literal(s) => f.write_str(s),
            CommandTemplate::Structured { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A fully resolved command line for one migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_render() {
        let template = CommandTemplate::Literal("psql -d app -f %s".to_string());
        let inv = template.render(Path::new("db/03.sql")).unwrap();

        assert_eq!(inv.program, "psql");
        assert_eq!(inv.args, vec!["-d", "app", "-f", "db/03.sql"]);
        assert_eq!(inv.to_string(), "psql -d app -f db/03.sql");
    }

    #[test]
    fn test_literal_collapses_repeated_spaces() {
        let template = CommandTemplate::Literal("sh  run.sh   %s".to_string());
        let inv = template.render(Path::new("01.sql")).unwrap();
        assert_eq!(inv.args, vec!["run.sh", "01.sql"]);
    }

    #[test]
    fn test_literal_too_short() {
        let template = CommandTemplate::Literal("%s".to_string());
        let err = template.render(Path::new("01.sql")).unwrap_err();
        assert!(err.to_string().contains("command is too short"));
    }

    #[test]
    fn test_literal_splits_paths_with_spaces() {
        let template = CommandTemplate::Literal("cat %s".to_string());
        let inv = template.render(Path::new("my dir/01.sql")).unwrap();
        assert_eq!(inv.args, vec!["my", "dir/01.sql"]);
    }

    #[test]
    fn test_structured_keeps_spaces() {
        let template = CommandTemplate::Structured {
            program: "psql".to_string(),
            args: vec!["--file=%s".to_string(), "--set".to_string(), "ON_ERROR_STOP=1".to_string()],
        };
        let inv = template.render(Path::new("my dir/01.sql")).unwrap();

        assert_eq!(inv.program, "psql");
        assert_eq!(inv.args, vec!["--file=my dir/01.sql", "--set", "ON_ERROR_STOP=1"]);
    }

    #[test]
    fn test_validate_placeholder_count() {
        assert!(CommandTemplate::Literal("psql -f %s".into()).validate().is_ok());
        assert!(CommandTemplate::Literal("psql -f".into()).validate().is_err());
        assert!(CommandTemplate::Literal("cp %s %s".into()).validate().is_err());

        let structured = CommandTemplate::Structured {
            program: "%s".into(),
            args: vec!["%s".into()],
        };
        assert!(structured.validate().is_err());
    }

    #[test]
    fn test_deserialize_both_forms() {
        let literal: CommandTemplate = serde_json::from_str(r#""psql -f %s""#).unwrap();
        assert_eq!(literal, CommandTemplate::Literal("psql -f %s".into()));

        let structured: CommandTemplate =
            serde_json::from_str(r#"{"program": "psql", "args": ["-f", "%s"]}"#).unwrap();
        assert_eq!(
            structured,
            CommandTemplate::Structured {
                program: "psql".into(),
                args: vec!["-f".into(), "%s".into()],
            }
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(CommandTemplate::default().is_empty());
        assert!(CommandTemplate::Literal("   ".into()).is_empty());
        assert!(!CommandTemplate::Literal("psql %s".into()).is_empty());
    }
}

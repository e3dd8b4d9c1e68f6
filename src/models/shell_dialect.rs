//! Shell Dialect Definitions
//!
//! Each dialect knows how to silence the shell's own prompt hooks and
//! install a [`Sentinel`] as its prompt. The dialect is picked in
//! configuration instead of being guessed from the executable name.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::sentinel::Sentinel;

/// Family of shell the session talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShellDialect {
    /// bash, sh, dash, ksh and friends (`PS1` / `PROMPT_COMMAND`)
    #[default]
    #[serde(alias = "bash", alias = "sh")]
    Posix,
    /// Z Shell (`PROMPT` / `precmd_functions`)
    Zsh,
    /// Fish Shell (`fish_prompt` function)
    Fish,
    /// PowerShell (`prompt` function)
    #[serde(alias = "pwsh")]
    PowerShell,
}

impl ShellDialect {
    /// Get a string representation of the dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellDialect::Posix => "posix",
            ShellDialect::Zsh => "zsh",
            ShellDialect::Fish => "fish",
            ShellDialect::PowerShell => "powershell",
        }
    }

    /// Line terminator appended to every line written to the shell
    pub fn line_ending(&self) -> &'static str {
        match self {
            ShellDialect::PowerShell => "\r\n",
            _ => "\n",
        }
    }

    /// Commands that disable prompt hooks and install `sentinel` as the prompt.
    ///
    /// The prompt assignment is always last, so the sentinel shows up exactly
    /// once after the whole batch has run.
    pub fn setup_commands(&self, sentinel: &Sentinel, echo: bool) -> Vec<String> {
        let (head, tail) = (sentinel.head(), sentinel.tail());
        let mut commands = Vec::new();

        if !echo && *self != ShellDialect::PowerShell {
            commands.push("stty -echo".to_string());
        }

        match self {
            ShellDialect::Posix => {
                commands.push("PROMPT_COMMAND=''".to_string());
                commands.push(format!("PS1='{}''{}'", head, tail));
            }
            ShellDialect::Zsh => {
                commands.push("precmd_functions=()".to_string());
                commands.push("RPROMPT=''".to_string());
                commands.push(format!("PROMPT='{}''{}'", head, tail));
            }
            ShellDialect::Fish => {
                commands.push("function fish_right_prompt; end".to_string());
                commands.push(format!(
                    "function fish_prompt; printf '%s' '{}''{}'; end",
                    head, tail
                ));
            }
            ShellDialect::PowerShell => {
                commands.push("$Host.UI.RawUI.WindowTitle = ''".to_string());
                commands.push(format!("function prompt {{ '{}' + '{}' }}", head, tail));
            }
        }

        commands
    }
}

impl FromStr for ShellDialect {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posix" | "bash" | "sh" => Ok(ShellDialect::Posix),
            "zsh" => Ok(ShellDialect::Zsh),
            "fish" => Ok(ShellDialect::Fish),
            "powershell" | "pwsh" => Ok(ShellDialect::PowerShell),
            other => Err(crate::error::Error::ConfigValidationFailed {
                field: "shell.dialect".to_string(),
                reason: format!("unknown shell dialect '{}'", other),
            }),
        }
    }
}

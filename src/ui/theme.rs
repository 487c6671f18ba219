use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// What a piece of CLI output means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Heading,
    Stored,
    Failure,
    Caution,
    Marker,
    Muted,
    /// Graph labels, table names and paths
    Label,
}

impl Role {
    /// Failures and cautions go to stderr
    pub fn on_stderr(&self) -> bool {
        matches!(self, Role::Failure | Role::Caution)
    }
}

/// Per-stream coloring decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    stdout: bool,
    stderr: bool,
}

impl Theme {
    /// Color each stream only when it is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        let allowed = std::env::var_os("NO_COLOR").is_none();
        Self {
            stdout: allowed && console::Term::stdout().is_term(),
            stderr: allowed && console::Term::stderr().is_term(),
        }
    }

    pub fn plain() -> Self {
        Self {
            stdout: false,
            stderr: false,
        }
    }

    pub fn colored() -> Self {
        Self {
            stdout: true,
            stderr: true,
        }
    }

    pub fn is_colored(&self, role: Role) -> bool {
        if role.on_stderr() { self.stderr } else { self.stdout }
    }

    pub fn style(&self, role: Role) -> Style {
        if !self.is_colored(role) {
            return Style::new();
        }
        match role {
            Role::Heading => Style::new().cyan().bold(),
            Role::Stored => Style::new().green().bold(),
            Role::Failure => Style::new().red().bold(),
            Role::Caution => Style::new().yellow(),
            Role::Marker => Style::new().magenta(),
            Role::Muted => Style::new().dimmed(),
            Role::Label => Style::new().blue().bold(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_are_decided_separately() {
        let theme = Theme {
            stdout: false,
            stderr: true,
        };
        assert!(theme.is_colored(Role::Failure));
        assert!(theme.is_colored(Role::Caution));
        assert!(!theme.is_colored(Role::Heading));
        assert!(!theme.is_colored(Role::Label));
    }

    #[test]
    fn test_plain_and_colored() {
        assert!(!Theme::plain().is_colored(Role::Stored));
        assert!(Theme::colored().is_colored(Role::Muted));
    }
}

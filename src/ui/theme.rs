use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output and rendered skill descriptions
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// PvE numbers in rendered descriptions
    pub value: Style,
    /// PvP numbers in rendered descriptions
    pub pvp: Style,
}

impl Theme {
    /// Every style is a no-op unless `colored` is set
    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            dim: pick(Style::new().white().dimmed()),
            value: pick(Style::new().bright_white().bold()),
            pvp: pick(Style::new().red()),
        }
    }
}

/// Shared theme, colored only when stdout is a terminal
pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| Theme::new(console::Term::stdout().is_term()))
}

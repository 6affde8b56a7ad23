//! Process-wide theme selection. Created once at startup, changed only by an
//! explicit toggle, and never shared with the request state.

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                primary: Rgb(0x19, 0x76, 0xd2),
                secondary: Rgb(0xdc, 0x00, 0x4e),
            },
            Theme::Dark => Palette {
                primary: Rgb(0x90, 0xca, 0xf9),
                secondary: Rgb(0xf4, 0x8f, 0xb1),
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Rgb,
    pub secondary: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeState {
    current: Theme,
}

impl ThemeState {
    pub fn new(initial: Theme) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn palette(&self) -> Palette {
        self.current.palette()
    }

    pub fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        tracing::debug!(theme = %self.current, "theme toggled");
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates_between_light_and_dark() {
        let mut state = ThemeState::new(Theme::default());
        assert_eq!(state.current(), Theme::Light);
        assert_eq!(state.toggle(), Theme::Dark);
        assert_eq!(state.toggle(), Theme::Light);
    }

    #[test]
    fn palettes_render_as_hex() {
        assert_eq!(Theme::Light.palette().primary.to_string(), "#1976d2");
        assert_eq!(Theme::Light.palette().secondary.to_string(), "#dc004e");
        assert_eq!(Theme::Dark.palette().primary.to_string(), "#90caf9");
        assert_eq!(Theme::Dark.palette().secondary.to_string(), "#f48fb1");
    }

    #[test]
    fn parses_theme_names_case_insensitively() {
        assert_eq!(" Dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
    }
}

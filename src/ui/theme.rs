use std::{env, sync::OnceLock, time::Duration};

use ratatui::style::Color;

pub const THEME_ENV: &str = "DUI_THEME";

const LUMA_THRESHOLD: f32 = 0.6;
// a single luma read right after startup can be noisy; use the median of a few
const LUMA_SAMPLES: usize = 5;
const LUMA_SAMPLE_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    panel_bg: Color,
    text: Color,
    text_muted: Color,
    accent: Color,
    accent_alt: Color,
    border: Color,
    selection_bg: Color,
    selection_fg: Color,
    warning: Color,
    error: Color,
}

impl Theme {
    /// `DUI_THEME=light|dark` wins, otherwise the terminal background decides.
    /// Resolved once, before the UI takes over the terminal.
    pub fn detect() -> Self {
        static THEME: OnceLock<Theme> = OnceLock::new();
        *THEME.get_or_init(|| {
            if let Some(theme) = env::var(THEME_ENV).ok().as_deref().and_then(Self::named) {
                return theme;
            }

            if let Some(luma) = detect_terminal_luma()
                && luma > LUMA_THRESHOLD
            {
                return Self::light();
            }

            Self::dark()
        })
    }

    pub fn named(name: &str) -> Option<Self> {
        match name.trim() {
            name if name.eq_ignore_ascii_case("light") => Some(Self::light()),
            name if name.eq_ignore_ascii_case("dark") => Some(Self::dark()),
            _ => None,
        }
    }

    pub fn dark() -> Self {
        Self {
            panel_bg: Color::Rgb(17, 22, 29),
            text: Color::Rgb(230, 237, 243),
            text_muted: Color::Rgb(154, 164, 178),
            accent: Color::Rgb(92, 207, 230),
            accent_alt: Color::Rgb(242, 177, 110),
            border: Color::Rgb(65, 76, 92),
            selection_bg: Color::Rgb(37, 50, 74),
            selection_fg: Color::Rgb(230, 237, 243),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
        }
    }

    pub fn light() -> Self {
        Self {
            panel_bg: Color::Rgb(255, 255, 255),
            text: Color::Rgb(31, 35, 40),
            text_muted: Color::Rgb(91, 97, 110),
            accent: Color::Rgb(31, 119, 180),
            accent_alt: Color::Rgb(180, 83, 9),
            border: Color::Rgb(156, 163, 175),
            selection_bg: Color::Rgb(219, 234, 254),
            selection_fg: Color::Rgb(15, 23, 42),
            warning: Color::Rgb(180, 83, 9),
            error: Color::Rgb(217, 72, 15),
        }
    }

    pub fn panel_bg(&self) -> Color {
        self.panel_bg
    }

    pub fn text(&self) -> Color {
        self.text
    }

    pub fn text_muted(&self) -> Color {
        self.text_muted
    }

    pub fn accent(&self) -> Color {
        self.accent
    }

    pub fn accent_alt(&self) -> Color {
        self.accent_alt
    }

    pub fn border(&self) -> Color {
        self.border
    }

    pub fn selection_bg(&self) -> Color {
        self.selection_bg
    }

    pub fn selection_fg(&self) -> Color {
        self.selection_fg
    }

    pub fn warning(&self) -> Color {
        self.warning
    }

    pub fn error(&self) -> Color {
        self.error
    }
}

fn detect_terminal_luma() -> Option<f32> {
    let mut samples = Vec::with_capacity(LUMA_SAMPLES);
    for attempt in 0..LUMA_SAMPLES {
        if let Ok(luma) = terminal_light::luma()
            && luma.is_finite()
        {
            samples.push(luma);
        }
        if attempt + 1 < LUMA_SAMPLES {
            std::thread::sleep(LUMA_SAMPLE_DELAY);
        }
    }

    if samples.is_empty() {
        return None;
    }

    Some(median_luma(&mut samples))
}

fn median_luma(samples: &mut [f32]) -> f32 {
    samples.sort_by(|a, b| a.total_cmp(b));
    let mid = samples.len() / 2;
    if samples.len().is_multiple_of(2) {
        (samples[mid - 1] + samples[mid]) / 2.0
    } else {
        samples[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_luma_odd() {
        let mut samples = [0.9_f32, 0.4_f32, 0.2_f32];
        let median = median_luma(&mut samples);
        assert!((median - 0.4).abs() < 1e-6);
    }

    #[test]
    fn median_luma_even() {
        let mut samples = [0.2_f32, 0.8_f32, 0.4_f32, 0.6_f32];
        let median = median_luma(&mut samples);
        assert!((median - 0.5).abs() < 1e-6);
    }

    #[test]
    fn named_themes() {
        assert_eq!(Theme::named("Light"), Some(Theme::light()));
        assert_eq!(Theme::named(" dark "), Some(Theme::dark()));
        assert_eq!(Theme::named("solarized"), None);
    }
}

//! Terminal theme for rendered rich text

use crossterm::style::Color;

/// Colors used when drawing a render tree in the terminal
#[derive(Debug, Clone)]
pub struct Theme {
    pub text_color: Color,
    pub dim_color: Color,
    pub heading_color: Color,
    pub link_color: Color,
    pub mention_color: Color,
    pub marker_color: Color,
    pub code_color: Color,
    pub code_bg_color: Color,
    pub border_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_color: Color::Rgb {
                r: 220,
                g: 223,
                b: 228,
            },
            dim_color: Color::Rgb {
                r: 120,
                g: 124,
                b: 130,
            },
            heading_color: Color::Rgb {
                r: 255,
                g: 184,
                b: 108,
            },
            link_color: Color::Rgb {
                r: 97,
                g: 175,
                b: 239,
            },
            mention_color: Color::Rgb {
                r: 198,
                g: 120,
                b: 221,
            },
            marker_color: Color::Rgb {
                r: 97,
                g: 175,
                b: 239,
            },
            code_color: Color::Rgb {
                r: 152,
                g: 195,
                b: 121,
            },
            code_bg_color: Color::Rgb {
                r: 40,
                g: 44,
                b: 52,
            },
            border_color: Color::Rgb {
                r: 90,
                g: 94,
                b: 100,
            },
        }
    }
}

impl Theme {
    /// Map a CSS-ish color (dialect palette name or #rrggbb) to a terminal
    /// color; unknown values fall back to the theme text color
    pub fn parse_color(&self, value: &str) -> Color {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() == 6 {
                if let (Ok(r), Ok(g), Ok(b)) = (
                    u8::from_str_radix(&hex[0..2], 16),
                    u8::from_str_radix(&hex[2..4], 16),
                    u8::from_str_radix(&hex[4..6], 16),
                ) {
                    return Color::Rgb { r, g, b };
                }
            }
        }
        match value {
            "red" => Color::Rgb { r: 224, g: 82, b: 82 },
            "orange" => Color::Rgb { r: 255, g: 150, b: 66 },
            "gold" => Color::Rgb { r: 241, g: 196, b: 15 },
            "green" => Color::Rgb { r: 80, g: 180, b: 100 },
            "lime" => Color::Rgb { r: 164, g: 222, b: 2 },
            "blue" => Color::Rgb { r: 97, g: 175, b: 239 },
            "purple" => Color::Rgb { r: 160, g: 131, b: 240 },
            "pink" => Color::Rgb { r: 255, g: 133, b: 173 },
            "gray" | "grey" => Color::Rgb { r: 140, g: 144, b: 150 },
            _ => self.text_color,
        }
    }
}

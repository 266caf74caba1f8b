use crossterm::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub muted: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub farewell: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            accent: Color::Cyan,
            muted: Color::DarkGrey,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            user_color: Color::Blue,
            assistant_color: Color::Green,
            farewell: Color::Magenta,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            accent: Color::DarkCyan,
            muted: Color::Grey,
            success: Color::DarkGreen,
            error: Color::DarkRed,
            warning: Color::DarkYellow,
            user_color: Color::DarkBlue,
            assistant_color: Color::DarkGreen,
            farewell: Color::DarkMagenta,
        }
    }

    /// No colors at all, for terminals that render escapes badly.
    pub fn mono() -> Self {
        Self {
            name: "mono",
            accent: Color::Reset,
            muted: Color::Reset,
            success: Color::Reset,
            error: Color::Reset,
            warning: Color::Reset,
            user_color: Color::Reset,
            assistant_color: Color::Reset,
            farewell: Color::Reset,
        }
    }

    /// Case-insensitive lookup; `none` and `plain` mean `mono`.
    pub fn try_by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "mono" | "none" | "plain" => Some(Self::mono()),
            _ => None,
        }
    }

    /// Like [`try_by_name`](Self::try_by_name), falling back to `dark`.
    pub fn by_name(name: &str) -> Self {
        Self::try_by_name(name).unwrap_or_else(Self::dark)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["dark", "light", "mono"]
    }
}

//! Color theme for CLI output

use comfy_table::Color as TableColor;

#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color for a unit count; subordinates are muted.
    pub fn units_color(&self, created: usize, requested: usize, subordinate: bool) -> TableColor {
        if subordinate {
            self.muted
        } else if requested > 0 && created == requested {
            self.success
        } else {
            self.error
        }
    }
}

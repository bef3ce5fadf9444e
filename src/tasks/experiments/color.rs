use anyhow::Result;
use log::error;
use plotters::prelude::RGBColor;

pub static FONT_SIZE: i32 = 22;
pub static STROKE_WIDTH: u32 = 3;

/// Colours handed out to series in order, wrapping around.
pub const SERIES_PALETTE: &[&str] = &[
    "dark-red",
    "dark-blue",
    "dark-green",
    "dark-orange",
    "dark-yellow",
];

pub fn get_color_from_label(label: &str) -> Result<RGBColor> {
    match label {
        "dark-red" => Ok(RGBColor(130, 1, 1)),
        "dark-blue" => Ok(RGBColor(1, 6, 130)),
        "dark-green" => Ok(RGBColor(0, 97, 29)),
        "dark-orange" => Ok(RGBColor(163, 99, 2)),
        "dark-yellow" => Ok(RGBColor(179, 176, 0)),
        _ => {
            error!("unrecognized label for color (label={label})");
            anyhow::bail!("unrecognized label (label={label})");
        }
    }
}

pub fn get_series_color(idx: usize) -> Result<RGBColor> {
    get_color_from_label(SERIES_PALETTE[idx % SERIES_PALETTE.len()])
}

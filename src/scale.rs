use ratatui::style::Color;
use thiserror::Error;

/// Sequential blues, light to dark
pub const BLUES: [Color; 9] = [
    Color::Rgb(0xf7, 0xfb, 0xff),
    Color::Rgb(0xde, 0xeb, 0xf7),
    Color::Rgb(0xc6, 0xdb, 0xef),
    Color::Rgb(0x9e, 0xca, 0xe1),
    Color::Rgb(0x6b, 0xae, 0xd6),
    Color::Rgb(0x42, 0x92, 0xc6),
    Color::Rgb(0x21, 0x71, 0xb5),
    Color::Rgb(0x08, 0x51, 0x9c),
    Color::Rgb(0x08, 0x30, 0x6b),
];

/// Neutral gray for entities without data
pub const NO_DATA: Color = Color::Rgb(0xcc, 0xcc, 0xcc);

pub const DEFAULT_DOMAIN: (f64, f64) = (0.0, 500.0);

/// Entity name given to features without a name property
pub const UNKNOWN_ENTITY: &str = "Unknown";

#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("palette must contain at least one color")]
    EmptyPalette,
    #[error("invalid domain [{0}, {1}]: bounds must be finite and increasing")]
    InvalidDomain(f64, f64),
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
}

/// One legend entry: the half-open value interval that maps to `color`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bucket {
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    pub color: Color,
}

impl Bucket {
    /// A value guaranteed to quantize back into this bucket
    pub fn representative(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Maps a continuous domain onto a fixed palette in equal-width steps.
///
/// Follows d3's `scaleQuantize`: with `n` colors there are `n - 1` interior
/// thresholds, a value lands in the bucket right of the last threshold it
/// reaches, and anything outside the domain clamps to the first or last color.
#[derive(Clone, Debug)]
pub struct QuantizeScale {
    domain: (f64, f64),
    palette: Vec<Color>,
    thresholds: Vec<f64>,
    no_data: Color,
}

impl QuantizeScale {
    pub fn new(domain: (f64, f64), palette: Vec<Color>, no_data: Color) -> Result<Self, ScaleError> {
        let (lo, hi) = domain;
        if palette.is_empty() {
            return Err(ScaleError::EmptyPalette);
        }
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(ScaleError::InvalidDomain(lo, hi));
        }

        let n = palette.len();
        let thresholds = (1..n)
            .map(|i| lo + (hi - lo) * i as f64 / n as f64)
            .collect();

        Ok(Self {
            domain,
            palette,
            thresholds,
            no_data,
        })
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn no_data(&self) -> Color {
        self.no_data
    }

    /// Bucket index for a finite value
    #[inline(always)]
    pub fn bucket(&self, value: f64) -> usize {
        self.thresholds.partition_point(|&t| t <= value)
    }

    /// Palette color for a value, or the no-data color when absent
    pub fn color(&self, value: Option<f64>) -> Color {
        match value {
            Some(v) if !v.is_nan() => self.palette[self.bucket(v)],
            _ => self.no_data,
        }
    }

    /// Color for a named entity. Unnamed features never take a palette color.
    pub fn color_for(&self, entity: &str, value: Option<f64>) -> Color {
        if entity == UNKNOWN_ENTITY {
            self.no_data
        } else {
            self.color(value)
        }
    }

    /// Value interval behind every palette color, in palette order
    pub fn buckets(&self) -> Vec<Bucket> {
        let (lo, hi) = self.domain;
        self.palette
            .iter()
            .enumerate()
            .map(|(index, &color)| Bucket {
                index,
                lower: if index == 0 { lo } else { self.thresholds[index - 1] },
                upper: self.thresholds.get(index).copied().unwrap_or(hi),
                color,
            })
            .collect()
    }
}

impl Default for QuantizeScale {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN,
            palette: BLUES.to_vec(),
            thresholds: (1..BLUES.len())
                .map(|i| DEFAULT_DOMAIN.1 * i as f64 / BLUES.len() as f64)
                .collect(),
            no_data: NO_DATA,
        }
    }
}

/// Parse `#rgb` or `#rrggbb` into a terminal RGB color
pub fn parse_hex(hex: &str) -> Result<Color, ScaleError> {
    let invalid = || ScaleError::InvalidHex(hex.to_string());
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match digits.len() {
        3 => {
            let expand = |i: usize| channel(&digits[i..i + 1].repeat(2));
            Ok(Color::Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Ok(Color::Rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(invalid()),
    }
}

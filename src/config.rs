use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::scale::{parse_hex, QuantizeScale, BLUES, DEFAULT_DOMAIN, NO_DATA};
use crate::timeline::{YearRange, FIRST_YEAR, LAST_YEAR};

pub const DEFAULT_INDICATOR: &str = "Death: Opioid use disorders";

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file with default settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GeoJSON FeatureCollection of country outlines
    #[arg(long, value_name = "FILE")]
    pub geo: Option<PathBuf>,

    /// JSON array of {Entity, Year, <indicator>...} rows
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Indicator column shown at startup
    #[arg(short, long)]
    pub indicator: Option<String>,

    /// Year shown at startup
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Auto-play step period in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// File that receives log output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Settings as written in the TOML config file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub geo: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub indicator: Option<String>,
    pub year: Option<i32>,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub tick_ms: Option<u64>,
    pub domain: Option<[f64; 2]>,
    pub palette: Option<Vec<String>>,
    pub no_data: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

/// Fully resolved settings: CLI flag, then config file, then built-in default
#[derive(Debug, Clone)]
pub struct Settings {
    pub geo: PathBuf,
    pub data: PathBuf,
    pub indicator: String,
    pub years: YearRange,
    pub start_year: i32,
    pub tick: Duration,
    pub scale: QuantizeScale,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Read the config file named on the command line (if any) and merge
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load_from_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let years = YearRange::new(
            file.first_year.unwrap_or(FIRST_YEAR),
            file.last_year.unwrap_or(LAST_YEAR),
        );

        let palette = match &file.palette {
            Some(hexes) => hexes
                .iter()
                .map(|hex| parse_hex(hex))
                .collect::<Result<Vec<_>, _>>()
                .context("Invalid palette color")?,
            None => BLUES.to_vec(),
        };
        let no_data = match &file.no_data {
            Some(hex) => parse_hex(hex).context("Invalid no-data color")?,
            None => NO_DATA,
        };
        let domain = file.domain.map(|[lo, hi]| (lo, hi)).unwrap_or(DEFAULT_DOMAIN);
        let scale = QuantizeScale::new(domain, palette, no_data).context("Invalid color scale")?;

        let start_year = years.clamp(cli.year.or(file.year).unwrap_or(years.first));
        let tick_ms = cli.tick_ms.or(file.tick_ms).unwrap_or(1000).max(1);

        Ok(Self {
            geo: cli
                .geo
                .or(file.geo)
                .unwrap_or_else(|| PathBuf::from("data/world-countries.json")),
            data: cli
                .data
                .or(file.data)
                .unwrap_or_else(|| PathBuf::from("data/deathDrug.json")),
            indicator: cli
                .indicator
                .or(file.indicator)
                .unwrap_or_else(|| DEFAULT_INDICATOR.to_string()),
            years,
            start_year,
            tick: Duration::from_millis(tick_ms),
            scale,
            log_file: cli
                .log_file
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from("drug-deaths-map.log")),
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(Cli::default(), FileConfig::default()).unwrap();
        assert_eq!(settings.indicator, DEFAULT_INDICATOR);
        assert_eq!(settings.years, YearRange::new(2000, 2019));
        assert_eq!(settings.start_year, 2000);
        assert_eq!(settings.tick, Duration::from_secs(1));
        assert_eq!(settings.scale.palette(), &BLUES);
        assert_eq!(settings.geo, PathBuf::from("data/world-countries.json"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::parse(
            r##"
            indicator = "Death: Cocaine use disorders"
            year = 2005
            tick_ms = 250
            data = "other.json"
            "##,
        )
        .unwrap();
        let cli = Cli {
            year: Some(2012),
            ..Cli::default()
        };
        let settings = Settings::merge(cli, file).unwrap();
        assert_eq!(settings.indicator, "Death: Cocaine use disorders");
        assert_eq!(settings.start_year, 2012);
        assert_eq!(settings.tick, Duration::from_millis(250));
        assert_eq!(settings.data, PathBuf::from("other.json"));
    }

    #[test]
    fn test_start_year_clamped_to_range() {
        let cli = Cli {
            year: Some(1990),
            ..Cli::default()
        };
        let settings = Settings::merge(cli, FileConfig::default()).unwrap();
        assert_eq!(settings.start_year, 2000);
    }

    #[test]
    fn test_custom_scale() {
        let file = FileConfig::parse(
            r##"
            domain = [0.0, 30.0]
            palette = ["#000000", "#ffffff", "#ff0000"]
            no_data = "#333"
            "##,
        )
        .unwrap();
        let settings = Settings::merge(Cli::default(), file).unwrap();
        assert_eq!(settings.scale.buckets().len(), 3);
        assert_eq!(settings.scale.color(Some(25.0)), Color::Rgb(0xff, 0, 0));
        assert_eq!(settings.scale.color(None), Color::Rgb(0x33, 0x33, 0x33));
    }

    #[test]
    fn test_bad_palette_is_an_error() {
        let file = FileConfig::parse(r##"palette = ["#nothex"]"##).unwrap();
        assert!(Settings::merge(Cli::default(), file).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("colour = 1").is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["drug-deaths-map", "--year", "2010", "-i", "Death: Alcohol"]);
        assert_eq!(cli.year, Some(2010));
        assert_eq!(cli.indicator.as_deref(), Some("Death: Alcohol"));
    }
}

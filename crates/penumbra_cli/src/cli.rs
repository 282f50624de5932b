use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use penumbra_renderer::RenderConfig;

/// Log levels selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "penumbra")]
#[command(about = "Path trace a scene of spheres on a cohort of workers")]
pub struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 512)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 512)]
    pub height: u32,

    /// Samples per pixel, split evenly over the 2x2 sub-pixels
    #[arg(short, long, default_value_t = 4)]
    pub samples: u32,

    /// Number of workers (defaults to the available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output file (.ppm or .png)
    #[arg(short, long, default_value = "image.ppm")]
    pub output: PathBuf,

    /// JSON scene file; renders the built-in Cornell box when omitted
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Hard limit on path bounces
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Directory for the timing log
    #[arg(long, default_value = "Data")]
    pub timing_dir: PathBuf,

    /// File name prefix of the timing log
    #[arg(long, default_value = "parallel")]
    pub run_tag: String,

    /// Do not write a timing log
    #[arg(long)]
    pub no_timing: bool,

    /// Set the logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    /// Render settings for these arguments.
    pub fn render_config(&self) -> Result<RenderConfig> {
        let samples_per_subpixel = self.samples / 4;
        if samples_per_subpixel == 0 {
            bail!("--samples must be at least 4 (got {})", self.samples);
        }
        if self.samples % 4 != 0 {
            log::warn!(
                "--samples {} is not a multiple of 4; rendering {} samples per pixel",
                self.samples,
                samples_per_subpixel * 4
            );
        }

        let config = RenderConfig::default()
            .with_resolution(self.width, self.height)
            .with_samples(samples_per_subpixel)
            .with_max_depth(self.max_depth);
        config.validate()?;
        Ok(config)
    }

    /// Cohort size.
    pub fn worker_count(&self) -> Result<usize> {
        match self.workers {
            Some(0) => bail!("--workers must be at least 1"),
            Some(n) => Ok(n),
            None => Ok(std::thread::available_parallelism().map_or(1, NonZeroUsize::get)),
        }
    }
}

//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Procedural cratered moons and planets, rendered offscreen.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "planets", about = "Procedural cube-sphere celestial bodies")]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Number of frames to render; 0 runs until the console quits.
    #[arg(long, default_value_t = 1)]
    pub frames: u64,

    /// Rebuild the baked surface and normal-interpolation rasters.
    #[arg(long)]
    pub generate_textures: bool,

    /// Write the last rendered frame to this PNG file.
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Do not read parameter commands from stdin.
    #[arg(long)]
    pub no_console: bool,

    /// Frame width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height.
    #[arg(long)]
    pub height: Option<u32>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if args.generate_textures {
            self.textures.regenerate = true;
        }
        if args.no_console {
            self.debug.console = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            generate_textures: true,
            no_console: true,
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.render.width, 1920);
        assert!(config.textures.regenerate);
        assert!(!config.debug.console);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.render.height, 720);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "planets",
            "--frames",
            "0",
            "--screenshot",
            "out.png",
            "--generate-textures",
            "--height",
            "480",
        ]);
        assert_eq!(args.frames, 0);
        assert_eq!(args.screenshot, Some(PathBuf::from("out.png")));
        assert!(args.generate_textures);
        assert_eq!(args.height, Some(480));
        assert!(!args.no_console);
    }

    #[test]
    fn test_frames_default_to_one() {
        assert_eq!(CliArgs::parse_from(["planets"]).frames, 1);
    }
}

//! CLI definitions and command dispatch.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use stylemix_core::{BatchResult, Config, HiDpiMatching, HttpFetcher, Pipeline, Settings, StyleDownloader, StyleMixer, run_stage};

#[derive(Parser)]
#[command(name = "stylemix")]
#[command(about = "Combine several map styles into one, with merged sprites and glyphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Styles config (default: $CONFIG_PATH, else configs/styles_config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Config> {
        let path = self.config.clone().unwrap_or_else(Config::default_path);
        info!("Loading config from {}", path.display());
        Config::load(&path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Directory holding raw_styles/, sprites/, fonts/, sprite/ and mixed_styles/
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
    /// How @2x sprites are paired with regular ones when the counts differ
    #[arg(long, value_enum, default_value_t = HiDpiMatching::ByName)]
    pub match_by: HiDpiMatching,
}

impl RunArgs {
    fn settings(&self) -> Settings {
        Settings::default()
            .work_dir(&self.work_dir)
            .request_timeout(Duration::from_secs(self.timeout))
            .hidpi_matching(self.match_by)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and mix every configured style, retrying on failure
    Run {
        #[command(flatten)]
        args: RunArgs,
        /// Attempts before giving up
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Download source styles, sprites and glyphs
    Download {
        #[command(flatten)]
        args: RunArgs,
        /// Only this mix
        #[arg(long)]
        mix: Option<String>,
    },
    /// Mix previously downloaded styles and sprites
    Mix {
        #[command(flatten)]
        args: RunArgs,
        /// Only this mix
        #[arg(long)]
        mix: Option<String>,
    },
    /// Print the loaded config with passwords masked
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Run { args, max_attempts } => {
                let mut settings = args.settings();
                if let Some(max_attempts) = max_attempts {
                    settings.retry.max_attempts = max_attempts;
                }
                let fetcher = HttpFetcher::new(settings.request_timeout)?;
                let pipeline = Pipeline::new(args.config.load()?, settings, fetcher);
                let report = pipeline.run_with_retry()?;
                summary("Download", &report.downloaded);
                summary("Mix", &report.mixed);
            }
            Commands::Download { args, mix } => {
                let config = args.config.load()?;
                let settings = args.settings();
                let fetcher = HttpFetcher::new(settings.request_timeout)?;
                let downloader = StyleDownloader::new(&config, &settings, &fetcher);
                match mix {
                    Some(mix_id) => {
                        let s = run_stage("download", || Ok(downloader.download_mix(&mix_id)?))?;
                        println!(
                            "{mix_id}: {} styles, {} sprite files, {} font stacks",
                            s.styles, s.sprite_files, s.font_stacks
                        );
                    }
                    None => check(run_stage("download", || Ok(downloader.download_all()?))?, "Download")?,
                }
            }
            Commands::Mix { args, mix } => {
                let config = args.config.load()?;
                let settings = args.settings();
                let mixer = StyleMixer::new(&config, &settings);
                match mix {
                    Some(mix_id) => {
                        let s = run_stage("mix", || Ok(mixer.mix(&mix_id)?))?;
                        println!(
                            "{mix_id}: {} sources, {} layers, {} filters, sprite: {}",
                            s.sources,
                            s.layers,
                            s.filters,
                            if s.sprite { "yes" } else { "no" }
                        );
                    }
                    None => check(run_stage("mix", || Ok(mixer.mix_all()?))?, "Mix")?,
                }
            }
            Commands::Config { config } => {
                print!("{}", config.load()?.redacted().to_yaml()?);
            }
        }
        Ok(())
    }
}

fn summary(label: &str, result: &BatchResult) {
    println!("{label}: {} succeeded, {} failed", result.succeeded, result.failed);
}

fn check(result: BatchResult, label: &str) -> Result<()> {
    summary(label, &result);
    if result.all_failed() {
        bail!("{label} failed for every mix");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_single_mix_download() {
        let cli = Cli::try_parse_from(["stylemix", "download", "--mix", "towns", "--work-dir", "/srv", "-c", "cfg.yaml"])
            .unwrap();
        let Commands::Download { args, mix } = cli.command else {
            panic!("expected download");
        };
        assert_eq!(mix.as_deref(), Some("towns"));
        assert_eq!(args.config.config, Some(PathBuf::from("cfg.yaml")));
        let settings = args.settings();
        assert_eq!(settings.work_dir, PathBuf::from("/srv"));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_match_by_position() {
        let cli = Cli::try_parse_from(["stylemix", "mix", "--match-by", "by-position"]).unwrap();
        let Commands::Mix { args, .. } = cli.command else {
            panic!("expected mix");
        };
        assert_eq!(args.settings().hidpi_matching, HiDpiMatching::ByPosition);
    }

    #[test]
    fn test_config_prints_redacted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("styles.yaml");
        std::fs::write(
            &path,
            "styles:\n  m:\n    sources:\n      - url: https://a.test/s.json\n        auth: { username: u, password: secret }\n",
        )
        .unwrap();

        let config = ConfigArgs { config: Some(path) }.load().unwrap();
        let shown = config.redacted().to_yaml().unwrap();

        assert!(!shown.contains("secret"));
        assert!(shown.contains("***"));
    }
}

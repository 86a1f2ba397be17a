//! viewer-framer: launch a remote-desktop viewer and frame one region of it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use viewer_framer::{
    capture::create_default_desktop,
    config::FramerConfig,
    model::Point,
    session::{RunOutcome, Session},
};

#[derive(Parser, Debug)]
#[command(name = "viewer-framer", version)]
#[command(about = "Launch a remote-desktop viewer, log in, and frame the bordered window it shows")]
struct Cli {
    /// JSON config file; flags and environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Exact title of the connected viewer window
    #[arg(long)]
    title: Option<String>,
    /// Viewer executable
    #[arg(long)]
    viewer: Option<PathBuf>,
    /// Password typed at the viewer prompt (letters and digits only)
    #[arg(long)]
    password: Option<String>,
    /// Final window position, x
    #[arg(long, requires = "final_y", allow_negative_numbers = true)]
    final_x: Option<i32>,
    /// Final window position, y
    #[arg(long, requires = "final_x", allow_negative_numbers = true)]
    final_y: Option<i32>,
    /// Minimum rectangle width
    #[arg(long)]
    min_width: Option<i32>,
    /// Minimum rectangle height
    #[arg(long)]
    min_height: Option<i32>,
    /// Luma at or below this is treated as black
    #[arg(long)]
    threshold: Option<u8>,
    /// Polls of the loading color before giving up
    #[arg(long)]
    load_max_polls: Option<u32>,
    /// Directory to write binarized debug captures to
    #[arg(long)]
    debug_dir: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut FramerConfig) {
        if let Some(title) = &self.title {
            config.window_title = title.clone();
        }
        if let Some(viewer) = &self.viewer {
            config.viewer_path = viewer.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let (Some(x), Some(y)) = (self.final_x, self.final_y) {
            config.final_position = Point::new(x, y);
        }
        if let Some(min_width) = self.min_width {
            config.detection.min_width = min_width;
        }
        if let Some(min_height) = self.min_height {
            config.detection.min_height = min_height;
        }
        if let Some(threshold) = self.threshold {
            config.detection.threshold = threshold;
        }
        if let Some(polls) = self.load_max_polls {
            config.loading.max_polls = polls;
        }
        if let Some(dir) = &self.debug_dir {
            config.debug_dir = Some(dir.clone());
        }
    }
}

fn init_logging(json: bool) {
    // Respects RUST_LOG; default level: info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("viewer_framer=info"));

    if json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_line_number(false)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let mut config = FramerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let result = runtime.block_on(async {
        config.validate()?;
        let desktop = create_default_desktop()?;
        info!(backend = %desktop.backend, "viewer-framer starting");
        Session::new(&desktop, &config).run().await
    });

    match result {
        Ok(outcome) => {
            if let RunOutcome::AlreadyRunning { .. } = outcome {
                info!("Viewer already open; nothing to do");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::error!("Hint: {}", e.remediation_hint());
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "viewer-framer",
            "--title",
            "lab",
            "--viewer",
            "/opt/vnc",
            "--final-x",
            "-10",
            "--final-y",
            "20",
            "--min-width",
            "150",
            "--threshold",
            "100",
            "--load-max-polls",
            "3",
        ]);
        let mut config = FramerConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.window_title, "lab");
        assert_eq!(config.viewer_path, PathBuf::from("/opt/vnc"));
        assert_eq!(config.final_position, Point::new(-10, 20));
        assert_eq!(config.detection.min_width, 150);
        assert_eq!(config.detection.min_height, 100);
        assert_eq!(config.detection.threshold, 100);
        assert_eq!(config.loading.max_polls, 3);
    }

    #[test]
    fn test_cli_final_position_needs_both() {
        assert!(Cli::try_parse_from(["viewer-framer", "--final-x", "5"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

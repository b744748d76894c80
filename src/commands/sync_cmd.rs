//! Sync CLI commands for pulling reference data from the remote API.

use clap::{Args, Subcommand};

use travelog::config::Config;
use travelog::db::SettingsRepository;
use travelog::sync::{ImageDownloads, PreloadOutcome, PreloadReport, Preloader};

/// Sync with the remote API
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Re-run the sync even if data was already preloaded
    #[arg(long, short)]
    force: bool,

    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show whether data has been preloaded and from where
    Status,

    /// Clear the preloaded flag so the next launch syncs again
    Reset,
}

impl SyncCommand {
    pub async fn run(
        &self,
        preloader: &Preloader,
        settings: &SettingsRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(preloader).await,
            Some(SyncSubcommand::Status) => status(settings, config).await,
            Some(SyncSubcommand::Reset) => {
                settings.set_has_preloaded(false).await?;
                println!("Preload flag cleared. Data will be synced on next launch.");
                Ok(())
            }
        }
    }

    async fn sync(&self, preloader: &Preloader) -> Result<(), Box<dyn std::error::Error>> {
        println!("Syncing with {}...", preloader.client().base_url());
        println!();

        let outcome = if self.force {
            preloader.sync_now().await
        } else {
            preloader.preload_if_needed().await
        };

        match outcome {
            PreloadOutcome::AlreadyPreloaded => {
                println!("Already preloaded. Use --force to sync again.");
                Ok(())
            }
            PreloadOutcome::AlreadyRunning => Err("A sync is already in progress".into()),
            PreloadOutcome::Completed(report) => {
                print_report(report).await;
                println!();
                println!("Sync complete.");
                Ok(())
            }
            PreloadOutcome::Failed {
                stage,
                error,
                images,
            } => {
                println!("  ✗ {} - {}", stage, error);
                print_pictures(images).await;
                Err(format!("Sync failed while syncing {}", stage).into())
            }
        }
    }
}

async fn print_report(report: PreloadReport) {
    println!(
        "  ✓ destinations ({} new, {} updated)",
        report.destinations.created, report.destinations.updated
    );
    println!(
        "  ✓ trips ({} new, {} updated)",
        report.trips.created, report.trips.updated
    );

    print_pictures(report.images).await;
}

/// Waits for picture downloads so they are not cut off when the process exits.
async fn print_pictures(images: ImageDownloads) {
    let requested = images.len();
    if requested > 0 {
        let stored = images.wait().await;
        println!("  ✓ pictures ({} of {} downloaded)", stored, requested);
    }
}

async fn status(
    settings: &SettingsRepository,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let preloaded = settings.has_preloaded().await?;
    print!("{}", render_status(config, preloaded));
    Ok(())
}

fn render_status(config: &Config, preloaded: bool) -> String {
    let mut out = String::new();
    out.push_str("Sync Status\n");
    out.push_str("===========\n\n");
    out.push_str(&format!("API:       {}\n", config.api_base_url.value));
    out.push_str(&format!(
        "Preloaded: {}\n",
        if preloaded { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "On launch: {}\n",
        if config.preload.value {
            "enabled"
        } else {
            "disabled"
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;
    use travelog::init_db;
    use travelog::sync::ApiClient;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(clap::Subcommand)]
    enum TestCommands {
        Sync(SyncCommand),
    }

    fn parse(args: &[&str]) -> SyncCommand {
        let argv = ["travelog", "sync"].iter().chain(args.iter());
        match TestCli::parse_from(argv).command {
            TestCommands::Sync(cmd) => cmd,
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        Config::load_with_env(Some(dir.join("missing.yaml")), |key| match key {
            "TRAVELOG_API_URL" => Some("http://127.0.0.1:9/".to_string()),
            "TRAVELOG_PRELOAD" => Some("false".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_render_status() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());

        let text = render_status(&config, true);
        assert!(text.contains("API:       http://127.0.0.1:9/"));
        assert!(text.contains("Preloaded: yes"));
        assert!(text.contains("On launch: disabled"));

        assert!(render_status(&config, false).contains("Preloaded: no"));
    }

    #[tokio::test]
    async fn test_reset_clears_flag_and_status_reads_it() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let settings = SettingsRepository::new(pool.clone());
        let preloader = Preloader::new(ApiClient::new(config.api_base_url.value.clone()), pool);

        settings.set_has_preloaded(true).await.unwrap();

        let status = parse(&["status"]);
        status.run(&preloader, &settings, &config).await.unwrap();
        assert!(settings.has_preloaded().await.unwrap());

        let reset = parse(&["reset"]);
        reset.run(&preloader, &settings, &config).await.unwrap();
        assert!(!settings.has_preloaded().await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_when_preloaded_does_not_fetch() {
        let temp_dir = tempdir().unwrap();
        let config = test_config(temp_dir.path());
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let settings = SettingsRepository::new(pool.clone());
        // Nothing listens on port 9; a fetch would fail the command
        let preloader = Preloader::new(ApiClient::new(config.api_base_url.value.clone()), pool);

        settings.set_has_preloaded(true).await.unwrap();

        let sync = parse(&[]);
        sync.run(&preloader, &settings, &config).await.unwrap();
        assert!(settings.has_preloaded().await.unwrap());

        let forced = parse(&["--force"]);
        assert!(forced.run(&preloader, &settings, &config).await.is_err());
    }
}

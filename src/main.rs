use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use cin_census::app::concat_use_case::ConcatUseCase;
use cin_census::app::degrade_use_case::DegradeUseCase;
use cin_census::app::flatfile_use_case::FlatFileUseCase;
use cin_census::config::AppConfig;
use cin_census::constants::MASTER_TABLE_FILE;
use cin_census::infra::files::{find_files, region_name};
use cin_census::infra::{
    CsvTableOutputAdapter, FileDegradationReportAdapter, JsonSummaryOutputAdapter, XmlTreeOutputAdapter,
};
use cin_census::logging;
use cin_census::pipeline::processing::normalize::validate_rules;

#[derive(Parser)]
#[command(name = "cin_census")]
#[command(about = "Degrade, clean and flatten CIN Census returns")]
#[command(version)]
struct Cli {
    /// Directory for the rolling JSON log
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Degrade, clean and flatten every XML return in a folder
    Run {
        /// Folder of one region's XML returns
        #[arg(long)]
        input: PathBuf,
        /// Flat table to write
        #[arg(long)]
        output: PathBuf,
        /// Field rules; the shipped rules are used when omitted
        #[arg(long, env = "CIN_CONFIG")]
        config: Option<PathBuf>,
        /// Degradation report to write
        #[arg(long)]
        report: Option<PathBuf>,
        /// JSON run summary to write
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Only degrade birthdates, saving the returns under <output>/<region>/
    Degrade {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Merge every regional flat file in a folder into the master table
    Concat {
        #[arg(long)]
        folder: PathBuf,
    },
    /// Check that every date and category field has a rule
    CheckConfig {
        #[arg(long, env = "CIN_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn xml_files(input: &Path) -> Result<Vec<PathBuf>> {
    let files = find_files(input, "xml").with_context(|| format!("Failed to list {}", input.display()))?;
    if files.is_empty() {
        bail!("No XML files found in {}", input.display());
    }
    info!("Found {} CIN files in folder {}", files.len(), input.display());
    Ok(files)
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load_or_builtin(path).context("Failed to load configuration")?;
    validate_rules(&config.fields).context("Configuration is incomplete")?;
    Ok(config)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir);

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            report,
            summary,
        } => {
            println!("🚀 Running degrade, clean and flatten...");
            let config = load_config(config.as_deref())?;
            let files = xml_files(&input)?;
            let region = region_name(&input);

            let mut use_case = FlatFileUseCase::new(config, Box::new(CsvTableOutputAdapter::new(&output)));
            if let Some(report) = report {
                use_case = use_case.with_report(Box::new(FileDegradationReportAdapter::at(report)));
            }
            if let Some(summary) = summary {
                use_case = use_case.with_summary(Box::new(JsonSummaryOutputAdapter::new(summary)));
            }

            match use_case.execute(&region, &files) {
                Ok(result) => {
                    println!(
                        "✅ {} rows from {} children written to {}",
                        result.rows,
                        result.children,
                        output.display()
                    );
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e).context("Pipeline failed");
                }
            }
        }
        Commands::Degrade { input, output } => {
            println!("🔒 Degrading birthdates...");
            let files = xml_files(&input)?;
            let region = region_name(&input);
            let region_dir = output.join(&region);

            let use_case = DegradeUseCase::new(
                Box::new(XmlTreeOutputAdapter::new(&region_dir)),
                Box::new(FileDegradationReportAdapter::in_folder(&region_dir)),
            );
            let reports = use_case.execute(&region, &files).context("Degradation failed")?;
            for report in &reports {
                println!("   {}: {}", report.file, report.degradation.summary());
            }
            println!("✅ Degraded returns written to {}", region_dir.display());
        }
        Commands::Concat { folder } => {
            println!("🔗 Concatenating regional flat files...");
            let files: Vec<PathBuf> = find_files(&folder, "csv")
                .with_context(|| format!("Failed to list {}", folder.display()))?
                .into_iter()
                .filter(|p| p.file_name().map_or(true, |n| n != MASTER_TABLE_FILE))
                .collect();

            let output = folder.join(MASTER_TABLE_FILE);
            let use_case = ConcatUseCase::new(Box::new(CsvTableOutputAdapter::new(&output)));
            let merged = use_case.execute(&files).context("Concatenation failed")?;
            println!("✅ {} rows written to {}", merged.len(), output.display());
        }
        Commands::CheckConfig { config } => {
            load_config(config.as_deref())?;
            println!("✅ Configuration has a rule for every date and category field");
        }
    }
    Ok(())
}

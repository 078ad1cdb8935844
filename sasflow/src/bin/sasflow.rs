// Extract the text of one document through blob storage and OCR.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use log::{info, warn};
use sasflow::{default_context, CancellationToken, Config, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "sasflow")]
#[command(version, about = "Upload a document and extract its text with Document Intelligence", long_about = None)]
struct Cli {
    /// Document to process (PDF, PNG or JPEG)
    file: PathBuf,

    /// Write the extracted text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let path = cli
        .file
        .to_str()
        .with_context(|| format!("path {} is not valid utf-8", cli.file.display()))?;

    let ctx = default_context();
    let config = Config::from_context(&ctx)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, abandoning the wait for extraction");
                cancel.cancel();
            }
        });
    }

    let pipeline = Pipeline::new(ctx, config).with_cancellation(cancel);
    let extraction = match pipeline.process(path).await {
        Ok(extraction) => extraction,
        Err(err) if err.is_job_error() => {
            warn!("{} was uploaded but text extraction did not complete", cli.file.display());
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    match cli.output {
        Some(output) => {
            tokio::fs::write(&output, &extraction.content)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("wrote extracted text to {}", output.display());
        }
        None => println!("{}", extraction.content),
    }

    Ok(())
}

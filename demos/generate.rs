use modelslab::{
    logger::{self, LoggerConfig},
    DownloadConfig, DownloadReport, GenerationParams, ModelsLabClient, ModelsLabConfig,
    OutputFormat, SaveOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logger::init_with_config(LoggerConfig::development())?;

    let client = ModelsLabClient::new(
        ModelsLabConfig::from_env(),
        DownloadConfig::from_env().with_concurrency(2),
    )?;

    let params = GenerationParams::new("A serene lake at sunset, digital art")
        .with_negative_prompt("blurry, low quality")
        .with_size(768, 512)
        .with_samples(2);
    let save = SaveOptions::new("output/sunset.png")
        .with_format(OutputFormat::Png)
        .with_name_prefix("sunset");

    let output = client.generate_and_download(params, Some(&save)).await?;
    log::info!(
        "🎨 Generated {} image(s) in {:?}s",
        output.result.image_urls.len(),
        output.result.generation_time
    );

    match output.download {
        Some(DownloadReport::Batch(report)) => {
            for saved in &report.results {
                log::info!("💾 {} ({})", saved.path.display(), saved.size);
            }
            for failed in &report.errors {
                log::error!("❌ Image {} failed: {}", failed.index + 1, failed.error);
            }
        }
        Some(DownloadReport::Single(outcome)) => log::info!("💾 {:?}", outcome),
        None => {}
    }

    Ok(())
}

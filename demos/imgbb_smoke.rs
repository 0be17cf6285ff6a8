//! Example: Test ImgBB Connectivity
//!
//! Verifies the image-host credentials by uploading a tiny generated JPEG
//! and printing the hosted URL.
//!
//! Usage:
//!   cargo run --example imgbb_smoke
//!
//! Prerequisites:
//!   - .env file with IMGBB_API_KEY (IMGBB_API_URL optional)

use staging_relay::services::image_host::ImgbbClient;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    println!("🖼️  ImgBB Connectivity Test\n");

    let api_key = env::var("IMGBB_API_KEY").expect("IMGBB_API_KEY not set");
    let api_url = env::var("IMGBB_API_URL")
        .unwrap_or_else(|_| "https://api.imgbb.com/1/upload".to_string());

    println!("📋 Configuration:");
    println!("   API Key: {}***", &api_key[..6.min(api_key.len())]);
    println!("   Endpoint: {api_url}\n");

    let client = ImgbbClient::new(&api_url, &api_key)?;

    // Tiny generated JPEG; tests connectivity, not image quality.
    let img = image::DynamicImage::new_rgb8(64, 48);
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)?;

    println!("🔄 Uploading {} bytes...", bytes.len());

    match client.upload(&bytes, "staging-relay-smoke").await {
        Ok(url) => {
            println!("✅ Upload successful");
            println!("   Hosted at: {url}");
            println!("\n✨ ImgBB credentials are working!");
        }
        Err(e) => {
            println!("❌ Upload failed: {e}");
            println!("\n🔍 Check that IMGBB_API_KEY is valid.");
            std::process::exit(1);
        }
    }

    Ok(())
}

//! Example: Test InstantDeco Submission
//!
//! Submits a room photo to InstantDeco and prints the request id. The
//! rendered result is delivered later to the configured webhook, so this
//! only verifies credentials and payload acceptance.
//!
//! Usage:
//!   cargo run --example submit_smoke [image-url]
//!
//! Prerequisites:
//!   - .env file with INSTANTDECO_API_KEY and PUBLIC_BASE_URL

use staging_relay::models::staging::TransformationType;
use staging_relay::services::instantdeco::{
    derive_block_elements, InstantDecoClient, StagingPayload,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    println!("🏠 InstantDeco Submission Test\n");

    let api_key = env::var("INSTANTDECO_API_KEY").expect("INSTANTDECO_API_KEY not set");
    let api_url = env::var("INSTANTDECO_API_URL")
        .unwrap_or_else(|_| "https://app.instantdeco.ai/api/1.1/wf/instant_deco".to_string());
    let public_base_url = env::var("PUBLIC_BASE_URL").expect("PUBLIC_BASE_URL not set");

    let img_url = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://i.ibb.co/sample/empty-living-room.jpg".to_string());
    let webhook_url = format!("{}/webhook-receiver", public_base_url.trim_end_matches('/'));

    println!("📋 Configuration:");
    println!("   API Key: {}***", &api_key[..6.min(api_key.len())]);
    println!("   Image: {img_url}");
    println!("   Webhook: {webhook_url}\n");

    let client = InstantDecoClient::new(&api_url, &api_key)?;

    let blocked = derive_block_elements(TransformationType::Furnish, false, false);
    let payload = StagingPayload {
        design: "scandinavian".to_string(),
        room_type: "living_room".to_string(),
        transformation_type: TransformationType::Furnish,
        img_url,
        webhook_url,
        num_images: 1,
        block_element: blocked.join(","),
        high_details_resolution: Some(true),
    };

    println!("🔄 Submitting staging request...");
    println!("   Blocked elements: {}", payload.block_element);

    match client.submit(&payload).await {
        Ok(request_id) => {
            println!("✅ Submission accepted");
            println!("   Request id: {request_id}");
            println!("\n✨ Watch the webhook receiver for the rendered result.");
        }
        Err(e) => {
            println!("❌ Submission failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

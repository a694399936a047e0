// Compress an image file to rank k and write the gray result.
//
// cargo run --example compress_image -- <input> <rank> <output.png>

use image::{ImageBuffer, Rgba};
use std::error::Error;
use svd_image::prelude::*;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: {} <input> <rank> <output.png>", args[0]);
        std::process::exit(2);
    }
    let rank: i64 = args[2].parse()?;

    let decoded = image::open(&args[1])?.to_rgba8();
    let (width, height) = decoded.dimensions();
    let source = Raster::new(width as usize, height as usize, decoded.into_raw())?;

    let mut pipeline = CompressionPipeline::default();
    let output = pipeline.run(&source, rank)?;

    println!(
        "{}x{} rank {}: storage ratio {:.3}, relative error {:.2E}",
        width,
        height,
        output.effective_rank,
        output.stats.storage_ratio,
        output.stats.relative_error
    );

    let encoded: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, output.raster.into_bytes())
            .ok_or("Failed to create image buffer")?;
    encoded.save(&args[3])?;

    Ok(())
}

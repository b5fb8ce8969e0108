use std::{env, error::Error, path::PathBuf};

use semantic::{build_encoder, SemanticConfig};

/// Embeds two job descriptions and prints their cosine similarity.
///
/// Uses the local ONNX model when its files are present and the hashing encoder otherwise.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let left = args.next().unwrap_or_else(|| "tailor".into());
    let right = args
        .next()
        .unwrap_or_else(|| "sewing machine operator".into());

    let cfg = match locate_model_assets() {
        Some((model_path, tokenizer_path)) => {
            println!("Using ONNX model at {}", model_path.display());
            SemanticConfig {
                mode: "onnx".into(),
                model_path,
                tokenizer_path: Some(tokenizer_path),
                ..SemanticConfig::default()
            }
        }
        None => {
            println!("ONNX assets not found, using the hashing encoder");
            SemanticConfig::stub("balanced")
        }
    };

    let encoder = build_encoder(&cfg).await?;
    let vectors = encoder.encode(&[left.clone(), right.clone()]).await?;
    let similarity: f32 = vectors[0]
        .iter()
        .zip(&vectors[1])
        .map(|(a, b)| a * b)
        .sum();

    println!(
        "{} ({} dims): cos({left:?}, {right:?}) = {similarity:.4}",
        encoder.model_name(),
        vectors[0].len()
    );
    Ok(())
}

fn locate_model_assets() -> Option<(PathBuf, PathBuf)> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../models")
        .join("all-mpnet-base-v2");
    let model = root.join("onnx").join("model.onnx");
    let tokenizer = root.join("tokenizer.json");
    (model.exists() && tokenizer.exists()).then_some((model, tokenizer))
}

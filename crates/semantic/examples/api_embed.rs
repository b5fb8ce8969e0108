use std::{env, error::Error};

use semantic::{build_encoder, SemanticConfig};

/// Encodes job descriptions through a remote feature-extraction endpoint.
///
/// ```bash
/// NCO_SEMANTIC_API_URL=https://router.huggingface.co/hf-inference/models/sentence-transformers/all-mpnet-base-v2/pipeline/feature-extraction \
/// NCO_SEMANTIC_API_TOKEN=hf_xxx \
/// cargo run -p occupation-semantic --example api_embed -- "tailor" "sewing machine operator"
/// ```
///
/// - `NCO_SEMANTIC_API_URL`: inference endpoint
/// - `NCO_SEMANTIC_API_TOKEN`: bearer token (optional)
/// - `NCO_SEMANTIC_API_PROVIDER`: `hf` (default), `openai` or `custom`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let texts: Vec<String> = {
        let args: Vec<String> = env::args().skip(1).collect();
        if args.is_empty() {
            vec!["sewing machine operator".into()]
        } else {
            args
        }
    };

    let api_url = env::var("NCO_SEMANTIC_API_URL")
        .map_err(|_| "set NCO_SEMANTIC_API_URL to a feature-extraction endpoint")?;

    let cfg = SemanticConfig {
        mode: "api".into(),
        api_url: Some(api_url),
        api_auth_header: env::var("NCO_SEMANTIC_API_TOKEN")
            .ok()
            .map(|token| format!("Bearer {token}")),
        api_provider: Some(env::var("NCO_SEMANTIC_API_PROVIDER").unwrap_or_else(|_| "hf".into())),
        ..SemanticConfig::default()
    };

    let encoder = build_encoder(&cfg).await?;
    let vectors = encoder.encode(&texts).await?;

    for (text, vector) in texts.iter().zip(&vectors) {
        let preview: Vec<String> = vector.iter().take(6).map(|v| format!("{v:.4}")).collect();
        println!("{text:?}: {} dims [{} ...]", vector.len(), preview.join(", "));
    }

    Ok(())
}

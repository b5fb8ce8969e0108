use async_trait::async_trait;
use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use std::thread;
use tokenizers::Tokenizer;
use tokio::sync::{mpsc, oneshot};

use crate::assets::{resolve_model_assets, ModelAssets};
use crate::normalize::normalize_all;
use crate::{Encoder, SemanticConfig, SemanticError};

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

/// How token-level outputs are reduced to one vector per text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pooling {
    /// Attention-masked average over tokens (sentence-transformers default).
    Mean,
    /// First token only.
    Cls,
}

impl Pooling {
    pub(crate) fn parse(value: &str) -> Result<Self, SemanticError> {
        match value {
            "mean" => Ok(Pooling::Mean),
            "cls" | "first" => Ok(Pooling::Cls),
            other => Err(SemanticError::InvalidConfig(format!(
                "unknown pooling strategy '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InferenceSettings {
    max_sequence_length: usize,
    batch_size: usize,
    pooling: Pooling,
}

struct EncodeJob {
    texts: Vec<String>,
    reply: oneshot::Sender<Result<Vec<Vec<f32>>, SemanticError>>,
}

/// Local sentence-transformer encoder backed by ONNX Runtime.
///
/// The session is not shareable across threads, so it lives on a dedicated inference thread
/// that is started (and the model loaded) by [`OnnxEncoder::load`]. Encode calls are queued to
/// that thread and answered over a oneshot channel; the handle itself is `Send + Sync`.
pub struct OnnxEncoder {
    model_name: String,
    dimension: usize,
    normalize: bool,
    jobs: mpsc::UnboundedSender<EncodeJob>,
}

impl OnnxEncoder {
    /// Resolves (and if needed downloads) the model assets, loads the session on the inference
    /// thread and probes the output dimension. Fails instead of returning a half-ready encoder.
    pub async fn load(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let settings = InferenceSettings {
            max_sequence_length: cfg.max_sequence_length,
            batch_size: cfg.batch_size,
            pooling: Pooling::parse(&cfg.pooling_strategy)?,
        };
        let assets = resolve_model_assets(cfg).await?;
        tracing::info!(
            model = %cfg.model_name,
            model_path = %assets.model_path.display(),
            tokenizer_path = %assets.tokenizer_path.display(),
            "loading onnx encoder"
        );

        let (ready_tx, ready_rx) = oneshot::channel();
        let (jobs, mut job_rx) = mpsc::unbounded_channel::<EncodeJob>();

        thread::Builder::new()
            .name("onnx-encoder".into())
            .spawn(move || {
                let mut model = match LoadedModel::load(&assets) {
                    Ok(model) => model,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let probe = model
                    .embed(&[String::new()], &settings)
                    .and_then(|mut vectors| {
                        vectors.pop().map(|v| v.len()).ok_or_else(|| {
                            SemanticError::Inference("model returned no outputs".into())
                        })
                    });
                let ready = probe.is_ok();
                let _ = ready_tx.send(probe);
                if !ready {
                    return;
                }

                while let Some(job) = job_rx.blocking_recv() {
                    let result = model.embed(&job.texts, &settings);
                    let _ = job.reply.send(result);
                }
                tracing::debug!("onnx encoder worker stopped");
            })?;

        let dimension = ready_rx
            .await
            .map_err(|_| SemanticError::WorkerUnavailable)??;
        if dimension == 0 {
            return Err(SemanticError::Inference(
                "model produced zero-length embeddings".into(),
            ));
        }
        tracing::info!(model = %cfg.model_name, dimension, "onnx encoder ready");

        Ok(Self {
            model_name: cfg.model_name.clone(),
            dimension,
            normalize: cfg.normalize,
            jobs,
        })
    }
}

#[async_trait]
impl Encoder for OnnxEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(EncodeJob {
                texts: texts.to_vec(),
                reply,
            })
            .map_err(|_| SemanticError::WorkerUnavailable)?;
        let mut vectors = response
            .await
            .map_err(|_| SemanticError::WorkerUnavailable)??;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "model returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        normalize_all(&mut vectors, self.normalize);
        Ok(vectors)
    }
}

struct LoadedModel {
    tokenizer: Tokenizer,
    session: Session<'static>,
}

impl LoadedModel {
    fn load(assets: &ModelAssets) -> Result<Self, SemanticError> {
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let env = ort_environment()?;
        let session = env
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(assets.model_path.clone())
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        Ok(Self { tokenizer, session })
    }

    fn embed(
        &mut self,
        texts: &[String],
        settings: &InferenceSettings,
    ) -> Result<Vec<Vec<f32>>, SemanticError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(settings.batch_size.max(1)) {
            let encoded = encode_documents(&self.tokenizer, chunk, settings.max_sequence_length)?;
            let batch = build_padded_arrays(encoded)?;
            vectors.extend(execute_session(&mut self.session, batch, settings.pooling)?);
        }
        Ok(vectors)
    }
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("occupation-semantic")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

struct PaddedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    /// Row-major copy of the mask, kept for pooling after the arrays are moved into the session.
    mask_rows: Vec<i64>,
}

fn encode_documents(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_sequence_length: usize,
) -> Result<Vec<EncodedDoc>, SemanticError> {
    let mut encoded = Vec::with_capacity(texts.len());
    for text in texts {
        let encoding = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        ids.truncate(max_sequence_length);
        mask.truncate(max_sequence_length);
        encoded.push(EncodedDoc { ids, mask });
    }
    Ok(encoded)
}

fn build_padded_arrays(encoded: Vec<EncodedDoc>) -> Result<PaddedBatch, SemanticError> {
    let seq_len = encoded.iter().map(|d| d.ids.len()).max().unwrap_or(0).max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len - ids.len();
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attention_mask = Array::from_shape_vec((batch, seq_len), mask_storage.clone())
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok(PaddedBatch {
        input_ids,
        attention_mask,
        mask_rows: mask_storage,
    })
}

fn execute_session(
    session: &mut Session<'static>,
    batch: PaddedBatch,
    pooling: Pooling,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let PaddedBatch {
        input_ids,
        attention_mask,
        mask_rows,
    } = batch;
    let (batch_size, seq_len) = input_ids.dim();
    let mut runtime_inputs = Vec::with_capacity(session.inputs.len());
    let mut input_ids_tensor = Some(input_ids);
    let mut attn_mask_tensor = Some(attention_mask);

    for input in &session.inputs {
        match input.name.as_str() {
            "input_ids" => {
                let tensor = input_ids_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig(
                        "model requested `input_ids` multiple times".into(),
                    )
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "attention_mask" => {
                let tensor = attn_mask_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig(
                        "model requested `attention_mask` multiple times".into(),
                    )
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "token_type_ids" => {
                runtime_inputs.push(Array::from_elem((batch_size, seq_len), 0_i64).into_dyn());
            }
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        }
    }

    if runtime_inputs.is_empty() {
        return Err(SemanticError::Inference(
            "model did not declare any inputs".into(),
        ));
    }

    let outputs = session
        .run::<i64, f32, _>(runtime_inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let output_tensor = outputs
        .into_iter()
        .next()
        .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))?;

    let shape = output_tensor.shape().to_vec();
    let flat: Vec<f32> = output_tensor.iter().copied().collect();
    match shape.as_slice() {
        [rows, dim] if *rows == batch_size && *dim > 0 => {
            Ok(flat.chunks(*dim).map(<[f32]>::to_vec).collect())
        }
        [rows, tokens, dim] if *rows == batch_size && *tokens == seq_len && *dim > 0 => {
            Ok(pool_token_embeddings(&flat, &mask_rows, batch_size, seq_len, *dim, pooling))
        }
        other => Err(SemanticError::Inference(format!(
            "unexpected model output shape {other:?} for batch of {batch_size}"
        ))),
    }
}

/// Reduces `[batch, seq, dim]` token embeddings to `[batch, dim]`.
pub(crate) fn pool_token_embeddings(
    flat: &[f32],
    mask: &[i64],
    batch: usize,
    seq_len: usize,
    dim: usize,
    pooling: Pooling,
) -> Vec<Vec<f32>> {
    let mut pooled = Vec::with_capacity(batch);
    for b in 0..batch {
        let row = &flat[b * seq_len * dim..(b + 1) * seq_len * dim];
        let vector = match pooling {
            Pooling::Cls => row[..dim].to_vec(),
            Pooling::Mean => {
                let mut sum = vec![0f32; dim];
                let mut count = 0f32;
                for t in 0..seq_len {
                    if mask[b * seq_len + t] == 0 {
                        continue;
                    }
                    count += 1.0;
                    for (acc, &value) in sum.iter_mut().zip(&row[t * dim..(t + 1) * dim]) {
                        *acc += value;
                    }
                }
                if count > 0.0 {
                    for acc in &mut sum {
                        *acc /= count;
                    }
                }
                sum
            }
        };
        pooled.push(vector);
    }
    pooled
}

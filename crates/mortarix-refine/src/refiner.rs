//! Batch refinement of extracted records.
//!
//! Records go to the model in small batches with a strict
//! "reply with a bare JSON array" contract. Gemini keys rotate through an
//! explicit cursor held by the client; when every key fails the batch falls
//! back to an OpenAI-compatible endpoint, and when that also fails the
//! original records are returned unchanged.

use std::sync::Mutex;

use mortarix_common::MaterialRecord;
use tracing::{debug, info, warn};

use crate::backend::{
    GeminiBackend, LlmBackend, LlmError, LlmRequest, OpenAiCompatibleBackend,
};

// ── Key cursor ────────────────────────────────────────────────────────────────

/// Rotating API-key cursor. The cursor is state owned by this object, not
/// by the process: two refiners rotate independently.
pub struct KeyCursor {
    keys: Vec<String>,
    current: Mutex<usize>,
}

impl KeyCursor {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, current: Mutex::new(0) }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in try-order, starting at the cursor position.
    pub fn rotation(&self) -> Vec<(usize, String)> {
        let start = *self.current.lock().unwrap_or_else(|e| e.into_inner());
        (0..self.keys.len())
            .map(|offset| {
                let index = (start + offset) % self.keys.len();
                (index, self.keys[index].clone())
            })
            .collect()
    }

    /// Pin the cursor to the key that last succeeded.
    pub fn commit(&self, index: usize) {
        if index < self.keys.len() {
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = index;
        }
    }
}

// ── JSON extraction ───────────────────────────────────────────────────────────

/// Pull the first complete JSON array out of a possibly chatty response.
/// Returns `None` when no balanced array exists.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Refiner ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Records per model call.
    pub batch_size: usize,
    pub gemini_model: String,
    pub max_tokens: Option<u32>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self { batch_size: 3, gemini_model: "gemini-2.0-flash".to_string(), max_tokens: None }
    }
}

pub struct Refiner {
    cursor: KeyCursor,
    fallback: Option<OpenAiCompatibleBackend>,
    config: RefineConfig,
}

impl Refiner {
    pub fn new(gemini_keys: Vec<String>) -> Self {
        Self { cursor: KeyCursor::new(gemini_keys), fallback: None, config: RefineConfig::default() }
    }

    pub fn with_fallback(mut self, backend: OpenAiCompatibleBackend) -> Self {
        self.fallback = Some(backend);
        self
    }

    pub fn with_config(mut self, config: RefineConfig) -> Self {
        self.config = config;
        self
    }

    /// Refine all records batch by batch. Batches whose refinement fails
    /// pass through unchanged; this method never fails.
    pub async fn refine(&self, records: Vec<MaterialRecord>) -> Vec<MaterialRecord> {
        if records.is_empty() {
            return records;
        }
        info!(records = records.len(), batch_size = self.config.batch_size, "starting refinement");

        let mut refined = Vec::with_capacity(records.len());
        for batch in records.chunks(self.config.batch_size.max(1)) {
            match self.refine_batch(batch).await {
                Some(rows) => refined.extend(rows),
                None => {
                    warn!("batch refinement failed, keeping extracted rows");
                    refined.extend(batch.iter().cloned());
                }
            }
        }
        refined
    }

    async fn refine_batch(&self, batch: &[MaterialRecord]) -> Option<Vec<MaterialRecord>> {
        let prompt = build_prompt(batch)?;

        // Gemini first, rotating keys. Key-scoped faults and malformed
        // JSON try the next key; anything else goes straight to fallback.
        for (index, key) in self.cursor.rotation() {
            let backend = GeminiBackend::new(key, self.config.gemini_model.clone());
            match self.complete_and_parse(&backend, &prompt).await {
                Ok(rows) => {
                    self.cursor.commit(index);
                    debug!(key_index = index, "gemini refinement succeeded");
                    return Some(rows);
                }
                Err(e) if e.is_key_fault() || matches!(e, LlmError::MalformedResponse(_)) => {
                    warn!(key_index = index, "gemini key attempt failed: {e}");
                }
                Err(e) => {
                    warn!("gemini unavailable, moving to fallback: {e}");
                    break;
                }
            }
        }

        let fallback = self.fallback.as_ref()?;
        match self.complete_and_parse(fallback, &prompt).await {
            Ok(rows) => {
                debug!(model = fallback.model_id(), "fallback refinement succeeded");
                Some(rows)
            }
            Err(e) => {
                warn!("fallback refinement failed: {e}");
                None
            }
        }
    }

    async fn complete_and_parse(
        &self,
        backend: &dyn LlmBackend,
        prompt: &str,
    ) -> Result<Vec<MaterialRecord>, LlmError> {
        let mut request = LlmRequest::user(prompt);
        request.max_tokens = self.config.max_tokens;
        let response = backend.complete(request).await?;
        parse_records(&response.content)
    }
}

/// Parse the model reply: first balanced JSON array, deserialised against
/// the record schema.
pub fn parse_records(text: &str) -> Result<Vec<MaterialRecord>, LlmError> {
    let array = extract_json_array(text)
        .ok_or_else(|| LlmError::MalformedResponse("no JSON array in reply".to_string()))?;
    serde_json::from_str(array)
        .map_err(|e| LlmError::MalformedResponse(format!("array does not match schema: {e}")))
}

fn build_prompt(batch: &[MaterialRecord]) -> Option<String> {
    let data = serde_json::to_string_pretty(batch).ok()?;
    Some(format!(
        r#"You are an expert civil engineering assistant. Your task is to refine the following structured data, provided as a JSON array.
The JSON must be perfectly formatted. Ensure all string values with double-quotes are properly escaped.

Data to refine:
{data}

Follow these instructions for each object:
1.  "Sl. No": Keep original value.
2.  "Material Name": Keep original value.
3.  "Test Name/Reference Code/Standard...": From the provided references, select the top 5 to 7 most relevant ones. Prioritize references that are specific (e.g., IS codes, table numbers, detailed section numbers) and directly support the "Any other relevant information" field. List each selected reference on a new line, numbered (1., 2., etc.). If fewer than 5 relevant references are found, list all that are relevant.
4.  "Specific Material Type/Material Definition": Provide a concise definition. If none can be clearly determined, state "No specific definition could be determined from the context."
5.  "Any other relevant information": Provide concise (1-2 paragraphs) details for a civil engineer.

Your response MUST be ONLY the JSON array of objects. Do not include any explanatory text, comments, or any characters before or after the opening `[` and closing `]` of the JSON array."#
    ))
}

/// Drop rows whose reference column is the sentinel, then reassign dense
/// serials. Applied after refinement, before report generation.
pub fn drop_unreferenced(records: Vec<MaterialRecord>) -> Vec<MaterialRecord> {
    let mut kept: Vec<MaterialRecord> =
        records.into_iter().filter(|r| r.has_references()).collect();
    for (position, record) in kept.iter_mut().enumerate() {
        record.serial = position as u32 + 1;
    }
    kept
}

//! Entry points for single and bulk annotation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::config::{EntityOutputMode, Settings};
use crate::engine::{AnnotationEngine, ConceptDatabase, DictionaryEngine, EngineError};
use crate::models::{Annotations, AppInfo, DocumentResult, InputDocument};

use super::dispatcher::dispatch_bulk;
use super::reassembler::reassemble;

/// Build the configured annotation engine.
///
/// Loads the concept database and applies the CUI filter when one is set.
pub fn build_engine(settings: &Settings) -> anyhow::Result<Arc<dyn AnnotationEngine>> {
    let cdb_path = settings
        .cdb_path
        .as_deref()
        .context("No concept database configured (set APP_MODEL_CDB_PATH or cdb_path)")?;

    let mut cdb = ConceptDatabase::load(cdb_path)?;
    let total = cdb.len();

    if let Some(ref filter_path) = settings.cui_filter_path {
        let keep = ConceptDatabase::load_cui_filter(filter_path)?;
        cdb = cdb
            .filter_by_cui(&keep)
            .with_context(|| format!("CUI filter {} removed every concept", filter_path.display()))?;
        tracing::info!(
            "Applied CUI filter {}: kept {} of {} concepts",
            filter_path.display(),
            cdb.len(),
            total
        );
    }

    Ok(Arc::new(DictionaryEngine::new(cdb)))
}

/// Runs documents through the annotation engine and shapes the results.
///
/// Stateless per call; one instance is shared by every request.
pub struct Processor {
    engine: Arc<dyn AnnotationEngine>,
    info: AppInfo,
    bulk_worker_ceiling: usize,
    output_mode: EntityOutputMode,
}

impl Processor {
    pub fn new(
        engine: Arc<dyn AnnotationEngine>,
        info: AppInfo,
        bulk_worker_ceiling: usize,
        output_mode: EntityOutputMode,
    ) -> Self {
        Self {
            engine,
            info,
            bulk_worker_ceiling: bulk_worker_ceiling.max(1),
            output_mode,
        }
    }

    /// Build the engine from settings and wrap it in a processor.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let engine = build_engine(settings)?;
        tracing::info!(
            engine = engine.engine_id(),
            model = %settings.model_name,
            workers = settings.bulk_worker_ceiling,
            "Annotation engine ready"
        );

        Ok(Self::new(
            engine,
            AppInfo::from_settings(settings),
            settings.bulk_worker_ceiling,
            settings.output_mode,
        ))
    }

    pub fn app_info(&self) -> &AppInfo {
        &self.info
    }

    /// Annotate one document.
    ///
    /// A missing text is reported in the result, not as an error. Engine
    /// failures are returned to the caller.
    pub async fn process_one(&self, document: InputDocument) -> Result<DocumentResult, EngineError> {
        let InputDocument { text, footer } = document;

        let Some(text) = text else {
            return Ok(DocumentResult::missing_text().with_footer(footer));
        };

        if text.trim().is_empty() {
            return Ok(DocumentResult::blank(text).with_footer(footer));
        }

        let started = Instant::now();
        let engine = self.engine.clone();
        let (text, entities) = tokio::task::spawn_blocking(move || {
            let entities = engine.get_entities(&text);
            (text, entities)
        })
        .await
        .map_err(|e| EngineError::WorkerPanicked(e.to_string()))?;
        let entities = entities?;

        tracing::debug!(entities = entities.len(), "Annotated document");

        Ok(DocumentResult::annotated(
            text,
            Annotations::reshape(entities, self.output_mode),
            started.elapsed().as_secs_f64(),
        )
        .with_footer(footer))
    }

    /// Annotate many documents, returning one result per input in input order.
    pub async fn process_bulk(&self, documents: Vec<InputDocument>) -> Vec<DocumentResult> {
        let dispatch = dispatch_bulk(self.engine.clone(), &documents, self.bulk_worker_ceiling).await;

        tracing::debug!(
            documents = documents.len(),
            annotated = dispatch.raw_results.len(),
            elapsed_ms = dispatch.elapsed.as_millis() as u64,
            "Bulk dispatch finished"
        );

        reassemble(&documents, dispatch, self.output_mode)
    }
}

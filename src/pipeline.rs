//! Ingestion: acquire → list → parse → chunk → summarize → store.
//!
//! The local copy of the repository only lives for the acquire/parse part of
//! the run. It is removed on every exit path, and the chunks stay in the store.

use crate::acquire::{CleanupGuard, Source};
use crate::chunking::chunk_files;
use crate::error::AppError;
use crate::files::{list_files, parse_files};
use crate::llm::summarize_repo;
use crate::models::UploadResult;
use crate::state::AppState;

/// Run one ingestion end to end.
pub async fn ingest(state: &AppState, source: Source) -> Result<UploadResult, AppError> {
    let _permit = state
        .ingest_semaphore
        .acquire()
        .await
        .map_err(|_| AppError::AcquisitionFailed("ingestion is shutting down".to_string()))?;

    let kind = source.kind();
    let workspace = state.workspace.clone();
    let name = workspace.source_name(&source)?;
    let handle = workspace.allocate(&name)?;
    let guard = workspace.guard(&handle);

    // The guard travels with the blocking task, so a timed-out clone is still
    // cleaned up once it finally stops writing.
    let timeout = state.config.acquire.clone_timeout();
    let populate_handle = handle.clone();
    let populated = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || {
            let result = workspace.populate(&populate_handle, &source);
            (guard, result)
        }),
    )
    .await;

    let guard = match populated {
        Ok(Ok((guard, Ok(())))) => guard,
        Ok(Ok((guard, Err(e)))) => {
            tracing::warn!("Acquisition of {name} failed: {e}");
            release(guard).await;
            return Err(e);
        }
        Ok(Err(e)) => {
            return Err(AppError::AcquisitionFailed(format!("acquisition task failed: {e}")));
        }
        Err(_) => {
            return Err(AppError::AcquisitionFailed(format!(
                "acquisition timed out after {}s",
                timeout.as_secs()
            )));
        }
    };

    let root = handle.local_path.clone();
    let (files, parsed_count, chunks) = tokio::task::spawn_blocking(move || {
        let files = list_files(&root);
        let parsed = parse_files(&root);
        let chunks = chunk_files(&parsed);
        // Everything needed from disk is in memory now
        drop(guard);
        (files, parsed.len(), chunks)
    })
    .await
    .map_err(|e| AppError::AcquisitionFailed(format!("parse task failed: {e}")))?;

    tracing::info!(
        "Parsed {name}: {} files listed, {parsed_count} parsed, {} chunks",
        files.len(),
        chunks.len()
    );

    let summary = summarize_repo(&state.cascade, handle.id, &name, &chunks, &state.config.summary).await;
    let result = UploadResult {
        repo_id: handle.id,
        repo_name: name.clone(),
        source: kind,
        file_count: files.len(),
        chunk_count: chunks.len(),
        files,
        repo_summary: summary.overview.clone(),
        architecture: summary.architecture.clone(),
    };

    state.store.save(handle.id, &name, chunks, summary);
    tracing::info!("Stored {name} as {}", handle.id);

    Ok(result)
}

/// Drop a cleanup guard on the blocking pool; removing a large tree must not
/// stall the runtime.
async fn release(guard: CleanupGuard) {
    if let Err(e) = tokio::task::spawn_blocking(move || drop(guard)).await {
        tracing::warn!("Cleanup task failed: {e}");
    }
}

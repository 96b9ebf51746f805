//! Dataset upload.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assistants::SessionApi;

/// A local file now available to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
    /// Name shown to the agent, relative to the dataset folder.
    pub filename: String,
}

/// Regular files directly inside `folder`, sorted by name.
pub async fn dataset_files(folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("cannot read dataset folder {}", folder.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Upload every file of `folder` and attach it to the assistant.
pub async fn upload_folder(
    api: &dyn SessionApi,
    assistant_id: &str,
    folder: &Path,
) -> anyhow::Result<Vec<UploadedFile>> {
    let mut uploaded = Vec::new();

    for path in dataset_files(folder).await? {
        let file = api
            .upload_file(&path)
            .await
            .with_context(|| format!("failed to upload {}", path.display()))?;
        api.attach_file(assistant_id, &file.id)
            .await
            .with_context(|| format!("failed to attach {} to assistant", file.id))?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(
            name: "dataset.file.uploaded",
            file_id = %file.id,
            filename = %filename,
            "Dataset file uploaded"
        );

        uploaded.push(UploadedFile {
            file_id: file.id,
            filename,
        });
    }

    if uploaded.is_empty() {
        tracing::warn!(folder = %folder.display(), "Dataset folder has no files");
    }

    Ok(uploaded)
}

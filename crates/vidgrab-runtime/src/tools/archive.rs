//! Archive download and selective extraction.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use vidgrab_core::ports::{InstallError, InstallProgress, ProgressFn};

/// Deletes the wrapped file when dropped.
pub(crate) struct TempArchive(PathBuf);

impl TempArchive {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        if self.0.exists() {
            let _ = fs::remove_file(&self.0);
        }
    }
}

/// Stream `url` into `dest`, reporting bytes as they arrive.
pub(crate) async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: ProgressFn<'_>,
) -> Result<u64, InstallError> {
    let response = client
        .get(url)
        .header("User-Agent", "vidgrab")
        .send()
        .await
        .map_err(|e| InstallError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(InstallError::Download(format!(
            "HTTP {} from {url}",
            response.status()
        )));
    }

    let total = response.content_length().unwrap_or(0);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(dest).await?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| InstallError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        progress(InstallProgress::Downloading { downloaded, total });
    }
    file.flush().await?;

    debug!(url, bytes = downloaded, "Archive downloaded");
    Ok(downloaded)
}

/// File name of an archive entry that belongs in the tool's `bin` directory.
///
/// Accepts entries under any `bin/` directory, plus a top-level entry named
/// exactly `binary_name` for archives that ship a single flat executable.
fn bin_entry_name<'a>(entry_path: &'a str, binary_name: &str) -> Option<&'a str> {
    if entry_path.ends_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = entry_path.split('/').filter(|p| !p.is_empty()).collect();
    let file_name = parts.pop()?;
    if file_name == ".." || file_name == "." {
        return None;
    }
    if parts.contains(&"bin") || (parts.is_empty() && file_name == binary_name) {
        Some(file_name)
    } else {
        None
    }
}

fn write_entry(reader: &mut impl Read, dest: &Path) -> Result<(), InstallError> {
    let mut out = File::create(dest)?;
    io::copy(reader, &mut out)?;
    make_executable(dest)?;
    Ok(())
}

/// Mark `path` executable on Unix; no-op elsewhere.
pub(crate) fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Extract `bin/` entries of a zip archive into `bin_dir`.
pub(crate) fn extract_bin_from_zip(
    archive: &Path,
    bin_dir: &Path,
    binary_name: &str,
) -> Result<Vec<PathBuf>, InstallError> {
    let file = File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| InstallError::Extraction(e.to_string()))?;
    fs::create_dir_all(bin_dir)?;

    let mut extracted = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| InstallError::Extraction(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let Some(file_name) = bin_entry_name(&name, binary_name) else {
            continue;
        };
        let dest = bin_dir.join(file_name);
        write_entry(&mut entry, &dest)?;
        extracted.push(dest);
    }
    Ok(extracted)
}

/// Extract `bin/` entries of a `.tar.xz` archive into `bin_dir`.
pub(crate) fn extract_bin_from_tar_xz(
    archive: &Path,
    bin_dir: &Path,
    binary_name: &str,
) -> Result<Vec<PathBuf>, InstallError> {
    let file = File::open(archive)?;
    let decoder = xz2::read::XzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);
    fs::create_dir_all(bin_dir)?;

    let mut extracted = Vec::new();
    let entries = tar
        .entries()
        .map_err(|e| InstallError::Extraction(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::Extraction(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .map_err(|e| InstallError::Extraction(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        let Some(file_name) = bin_entry_name(&name, binary_name) else {
            continue;
        };
        let dest = bin_dir.join(file_name);
        write_entry(&mut entry, &dest)?;
        extracted.push(dest);
    }
    Ok(extracted)
}

/// Relative path of `entry_path` below the first `marker/` directory.
fn subtree_relative(entry_path: &str, marker: &str) -> Option<PathBuf> {
    let needle = format!("{marker}/");
    let start = entry_path.find(&needle)? + needle.len();
    let relative = Path::new(&entry_path[start..]);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    (safe && relative.components().next().is_some()).then(|| relative.to_path_buf())
}

/// Extract the `marker/` subtree of a zip archive into `dest/marker`.
///
/// Returns the number of files written.
pub(crate) fn extract_zip_subtree(
    archive: &Path,
    marker: &str,
    dest: &Path,
) -> Result<usize, InstallError> {
    let file = File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| InstallError::Extraction(e.to_string()))?;
    let target_root = dest.join(marker);

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| InstallError::Extraction(e.to_string()))?;
        let name = entry.name().to_string();
        let Some(relative) = subtree_relative(&name, marker) else {
            continue;
        };
        let target = target_root.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    if written == 0 {
        return Err(InstallError::Extraction(format!(
            "archive has no {marker}/ directory"
        )));
    }
    Ok(written)
}

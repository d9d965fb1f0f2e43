//! Resumable single-object downloads and small file utilities.
use crate::error::LandsatError;
use crate::store::ObjectStore;
use anyhow::{anyhow, Result};
use flate2::read::GzDecoder;
use futures_util::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use md5::{Digest, Md5};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct TransferOptions {
    pub progress: bool,
    /// Compare the local MD5 digest with the one advertised by the store.
    pub verify: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            progress: true,
            verify: true,
        }
    }
}

fn progress_bar(total: u64, name: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .expect("Progress template should always parse")
        .progress_chars("=>-");
    ProgressBar::new(total)
        .with_style(style)
        .with_message(name.to_string())
}

/// Download the object `key` into `out_dir`, naming the file after the last
/// key segment. Returns the path of the local file.
///
/// A local file of the same size as the remote object is considered
/// complete. Interrupted downloads resume from `<file>.partial`.
pub async fn download_file(
    store: &impl ObjectStore,
    key: &str,
    out_dir: &Path,
    options: TransferOptions,
) -> Result<PathBuf> {
    let file_name = key
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or(anyhow!("Object key has no file name: {}", key))?;
    download_to(store, key, &out_dir.join(file_name), options).await
}

/// Same as [`download_file`] with an explicit destination path.
pub async fn download_to(
    store: &impl ObjectStore,
    key: &str,
    dst: &Path,
    options: TransferOptions,
) -> Result<PathBuf> {
    let head = store.head_object(key).await?;
    let total_size = head.size;

    if dst.is_file() && fs::metadata(dst)?.len() == total_size {
        log::info!("{} already exists, skipping", dst.display());
        return Ok(dst.to_path_buf());
    }

    if let Some(parent_dir) = dst.parent() {
        fs::create_dir_all(parent_dir)?;
    }

    let partial = partial_path(dst);
    let mut partial_file = OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(&partial)?;
    let mut byte_count = partial_file.metadata()?.len();

    // Remote object changed since the partial download started
    if byte_count > total_size {
        partial_file.set_len(0)?;
        byte_count = 0;
    }

    if byte_count > 0 {
        let progress = (byte_count as f64 / total_size as f64) * 100.;
        log::info!("Resuming {} from {:.2}% completion", key, progress);
    }

    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bar = progress_bar(total_size, &name, options.progress);
    bar.set_position(byte_count);

    if byte_count < total_size {
        log::debug!("Downloading {} ({} bytes)", key, total_size);
        let mut chunks = store
            .get_object_range(key, byte_count, total_size - 1)
            .await?;
        while let Some(bytes) = chunks.try_next().await? {
            partial_file.write_all(&bytes)?;
            byte_count += bytes.len() as u64;
            bar.set_position(byte_count);
        }
        partial_file.flush()?;
    }
    bar.finish_and_clear();
    drop(partial_file);

    fs::rename(&partial, dst)?;

    if options.verify {
        if let Some(expected) = head.md5 {
            let actual = compute_md5(dst)?;
            if actual != expected {
                fs::remove_file(dst)?;
                return Err(LandsatError::CorruptedDownload(dst.to_path_buf()).into());
            }
        }
    }

    log::info!("Downloaded {}", dst.display());
    Ok(dst.to_path_buf())
}

fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Hexadecimal MD5 digest of a file.
pub fn compute_md5<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Decompress a `.gz` file next to itself. Returns the decompressed path.
///
/// Output is staged in `<file>.partial` and renamed on success.
pub fn decompress<P: AsRef<Path>>(path: P, remove_archive: bool) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.extension().and_then(|e| e.to_str()) != Some("gz") {
        return Err(anyhow!("Not a .gz archive: {}", path.display()));
    }
    let out_path = path.with_extension("");
    let partial = partial_path(&out_path);

    if let Err(e) = gunzip(path, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e.context(format!("Failed to decompress {}", path.display())));
    }
    fs::rename(&partial, &out_path)?;

    if remove_archive {
        fs::remove_file(path)?;
    }
    Ok(out_path)
}

fn gunzip(src: &Path, dst: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut writer = BufWriter::new(File::create(dst)?);
    io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;
    Ok(())
}

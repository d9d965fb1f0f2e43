//! Downloading Landsat products from the public archive.
use crate::download_plan::{DownloadPlan, DownloadTask};
use crate::product_id::ProductMeta;
use crate::sensors;
use crate::store::ObjectStore;
use crate::transfer::TransferOptions;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Landsat product to download.
#[derive(Debug, Clone)]
pub struct Product {
    pub meta: ProductMeta,
}

impl Product {
    pub fn new(product_id: &str) -> Result<Self> {
        Ok(Self {
            meta: ProductMeta::parse(product_id)?,
        })
    }

    pub fn product_id(&self) -> &str {
        &self.meta.product_id
    }

    /// File labels published for the product's sensor.
    pub fn available(&self) -> Result<&'static [String]> {
        sensors::available_files(&self.meta.sensor)
    }

    /// Bucket key of the file behind a label such as `B4.TIF` or `README.GTF`.
    pub fn key(&self, label: &str) -> String {
        let basename = if label.contains("README") {
            label.to_string()
        } else {
            format!("{}_{}", self.meta.product_id, label)
        };
        format!("{}{}", self.meta.prefix(), basename)
    }

    /// Labels to fetch: everything available when `files` is empty, otherwise
    /// the requested labels the sensor actually publishes.
    pub fn select(&self, files: &[String]) -> Result<Vec<String>> {
        let available = self.available()?;
        if files.is_empty() {
            return Ok(available.to_vec());
        }

        let mut selected = vec![];
        for file in files {
            let label = file.trim().replace(".tif", ".TIF");
            if available.contains(&label) {
                selected.push(label);
            } else {
                log::warn!("{} not available for {}, skipping", label, self.meta.sensor);
            }
        }
        Ok(selected)
    }

    /// Scene directory the product is downloaded into.
    pub fn scene_dir(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.meta.product_id)
    }

    pub fn plan(&self, out_dir: &Path, files: &[String]) -> Result<DownloadPlan> {
        let dst_dir = self.scene_dir(out_dir);
        let tasks = self
            .select(files)?
            .iter()
            .map(|label| {
                let key = self.key(label);
                let file_name = key.rsplit('/').next().unwrap_or(label);
                DownloadTask::new(&key, &dst_dir.join(file_name))
            })
            .collect();
        Ok(DownloadPlan::new(tasks))
    }

    /// Download the product into `out_dir/<product id>/`. Returns that
    /// directory.
    pub async fn download(
        &self,
        store: &impl ObjectStore,
        out_dir: &Path,
        files: &[String],
        options: TransferOptions,
    ) -> Result<PathBuf> {
        let dst_dir = self.scene_dir(out_dir);
        std::fs::create_dir_all(&dst_dir)?;
        self.plan(out_dir, files)?.execute(store, options).await?;
        Ok(dst_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> TransferOptions {
        TransferOptions {
            progress: false,
            verify: true,
        }
    }

    fn archive_for(product: &Product) -> MemoryStore {
        let mut store = MemoryStore::default();
        for label in product.available().unwrap() {
            store.insert(&product.key(label), b"");
        }
        store
    }

    #[test]
    fn test_key() {
        let product = Product::new("LE07_L1TP_205050_19991104_20170216_01_T1").unwrap();
        assert_eq!(
            product.key("B1.TIF"),
            "LE07/01/205/050/LE07_L1TP_205050_19991104_20170216_01_T1/LE07_L1TP_205050_19991104_20170216_01_T1_B1.TIF"
        );
        assert_eq!(
            product.key("README.GTF"),
            "LE07/01/205/050/LE07_L1TP_205050_19991104_20170216_01_T1/README.GTF"
        );
    }

    #[test]
    fn test_select() {
        let product = Product::new("LC08_L1TP_193027_20200712_20200722_01_T1").unwrap();
        let files = vec!["b4.TIF".to_string(), "B4.tif".to_string(), " MTL.txt".to_string()];
        // Only the suffix case is normalised
        assert_eq!(product.select(&files).unwrap(), vec!["B4.TIF", "MTL.txt"]);
        assert_eq!(product.select(&[]).unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_download_lt05() {
        let pid = "LT05_L1TP_195051_19950807_20170107_01_T1";
        let product = Product::new(pid).unwrap();
        let store = archive_for(&product);
        let dir = TempDir::new().unwrap();

        let scene_dir = product.download(&store, dir.path(), &[], quiet()).await.unwrap();
        assert_eq!(scene_dir, dir.path().join(pid));
        assert!(scene_dir.join(format!("{pid}_B1.TIF")).is_file());
        assert!(scene_dir.join(format!("{pid}_MTL.txt")).is_file());
        assert!(scene_dir.join("README.GTF").is_file());
    }

    #[tokio::test]
    async fn test_download_le07() {
        let pid = "LE07_L1TP_205050_19991104_20170216_01_T1";
        let product = Product::new(pid).unwrap();
        let store = archive_for(&product);
        let dir = TempDir::new().unwrap();

        let scene_dir = product.download(&store, dir.path(), &[], quiet()).await.unwrap();
        assert!(scene_dir.join(format!("{pid}_B1.TIF")).is_file());
        assert!(scene_dir.join(format!("{pid}_B6_VCID_1.TIF")).is_file());
        assert!(scene_dir.join(format!("{pid}_MTL.txt")).is_file());
    }

    #[tokio::test]
    async fn test_download_lc08_selection() {
        let pid = "LC08_L1TP_193027_20200712_20200722_01_T1";
        let product = Product::new(pid).unwrap();
        let store = archive_for(&product);
        let dir = TempDir::new().unwrap();

        let files = vec!["B4.tif".to_string(), "BQA.TIF".to_string(), "B12.TIF".to_string()];
        let scene_dir = product
            .download(&store, dir.path(), &files, quiet())
            .await
            .unwrap();

        let mut contents = fs::read_dir(&scene_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        contents.sort();
        assert_eq!(contents, vec![format!("{pid}_B4.TIF"), format!("{pid}_BQA.TIF")]);
    }

    #[test]
    fn test_invalid_product() {
        assert!(Product::new("not-a-product").is_err());
    }
}

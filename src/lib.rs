#![allow(async_fn_in_trait)]
pub mod aoi;
pub mod band;
pub mod catalog;
pub mod config;
pub mod download;
pub mod download_plan;
pub mod error;
pub mod preprocessing;
pub mod product_id;
pub mod query;
pub mod raster;
pub mod scene;
pub mod selection;
pub mod sensors;
pub mod store;
pub mod transfer;

pub use catalog::{Catalog, SceneRecord};
pub use config::Settings;
pub use download::Product;
pub use error::LandsatError;
pub use query::SearchQuery;
pub use scene::Scene;
pub use store::{ObjectStore, Store};

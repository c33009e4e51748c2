use crate::domain::model::Course;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the static course catalogue comes from.
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Course>>;

    fn describe(&self) -> String;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn catalogue_kind(&self) -> &str;
    fn catalogue_location(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn top_k(&self) -> usize;
    fn engine_settings(&self) -> crate::core::engine::EngineSettings;
}

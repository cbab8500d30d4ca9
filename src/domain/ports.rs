use crate::domain::model::Tracked;
use crate::domain::schema::Schema;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Source of the provider block values (HCL config, CLI flags, a settings file).
pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> Option<&str>;
    fn api_key(&self) -> Option<&str>;
}

/// A managed resource backed by the Archestra API.
///
/// `Model` is the flat attribute record; unset attributes are `None` and the
/// lifecycle driver converts it to and from JSON attribute maps.
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Default + Send + Sync;

    /// Type name without the `archestra_` prefix.
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model>;

    async fn read(&self, state: &Self::Model) -> Result<Tracked<Self::Model>>;

    async fn update(&self, plan: &Self::Model, prior: &Self::Model) -> Result<Self::Model>;

    async fn delete(&self, state: &Self::Model) -> Result<()>;
}

#[async_trait]
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Default + Send + Sync;

    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, config: &Self::Model) -> Result<Self::Model>;
}

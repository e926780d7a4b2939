//! Persistent settings storage bridge.
//!
//! A small key-value surface for user preferences that must survive restarts
//! (volume, last station, ...). Hosts back it with whatever the platform
//! offers: browser local storage, a preferences plist, a flat file.

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// Key-value store for persisted player settings.
///
/// Keys are flat strings; callers namespace them (`"player.volume"`). Reads of
/// missing keys return `Ok(None)`, never an error.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SettingsStore: PlatformSendSync {
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    async fn set_f64(&self, key: &str, value: f64) -> Result<()>;

    async fn get_f64(&self, key: &str) -> Result<Option<f64>>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn has_key(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Settings {}

        #[async_trait::async_trait]
        impl SettingsStore for Settings {
            async fn set_string(&self, key: &str, value: &str) -> Result<()>;
            async fn get_string(&self, key: &str) -> Result<Option<String>>;
            async fn set_f64(&self, key: &str, value: f64) -> Result<()>;
            async fn get_f64(&self, key: &str) -> Result<Option<f64>>;
            async fn delete(&self, key: &str) -> Result<()>;
            async fn has_key(&self, key: &str) -> Result<bool>;
        }
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let mut store = MockSettings::new();
        store
            .expect_get_f64()
            .with(eq("player.volume"))
            .returning(|_| Ok(None));

        let value = store.get_f64("player.volume").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn roundtrip_through_mock() {
        let mut store = MockSettings::new();
        store
            .expect_set_f64()
            .with(eq("player.volume"), eq(0.7))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_get_f64()
            .with(eq("player.volume"))
            .returning(|_| Ok(Some(0.7)));

        store.set_f64("player.volume", 0.7).await.unwrap();
        assert_eq!(store.get_f64("player.volume").await.unwrap(), Some(0.7));
    }
}

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Document access the rest of the crate goes through. One JSON document
/// per key; a single set is atomic, a sequence of sets is not.
pub trait DocumentStore {
    fn get_raw(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set_raw(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete_raw(&self, key: &str) -> anyhow::Result<()>;

    fn get_doc<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_doc<T: Serialize>(&self, key: &str, doc: &T) -> anyhow::Result<()> {
        self.set_raw(key, &serde_json::to_vec(doc)?)
    }
}

impl DocumentStore for spin_sdk::key_value::Store {
    fn get_raw(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.get(key)?)
    }

    fn set_raw(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        Ok(self.set(key, value)?)
    }

    fn delete_raw(&self, key: &str) -> anyhow::Result<()> {
        Ok(self.delete(key)?)
    }
}

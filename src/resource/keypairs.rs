//! SSH keypair adapter

use super::adapter::{KindSpec, ResourceAdapter};
use super::decode::keypair;
use super::filter::{FilterOptions, KeypairFilter};
use super::model::Keypair;
use super::registry::{Operation, ResourceKind};
use crate::error::{AdapterError, CallStyle, Result};
use crate::provider::QueryClient;

#[derive(Clone)]
pub struct KeypairAdapter {
    inner: ResourceAdapter<Keypair>,
}

impl KeypairAdapter {
    pub fn new(client: QueryClient) -> Self {
        Self {
            inner: ResourceAdapter::new(
                client,
                KindSpec {
                    kind: ResourceKind::Keypair,
                    decode: keypair::decode,
                },
            ),
        }
    }

    /// Generate a keypair. The answer carries the private key, which the
    /// provider never returns again.
    pub async fn create(&self, name: &str) -> Result<Keypair> {
        let operation = self.inner.operation(Operation::Create);
        let request = self.inner.request(Operation::Create)?.param("KeyName", name).build();
        let doc = self
            .inner
            .execute(Operation::Create, CallStyle::Create, name, request)
            .await?
            .ok_or_else(|| AdapterError::fatal(&operation, name, "empty response"))?;

        let key = keypair::decode(&doc, self.inner.client().context())
            .map_err(|e| e.into_adapter(&operation, name))?
            .filter(|k| k.private_key.is_some())
            .ok_or_else(|| AdapterError::fatal(&operation, name, "invalid response to keypair creation"))?;
        Ok(Keypair {
            name: name.to_string(),
            id: name.to_string(),
            ..key
        })
    }

    /// Register an existing public key
    pub async fn import(&self, name: &str, public_material: &str) -> Result<Keypair> {
        let operation = self.inner.operation(Operation::Import);
        let request = self
            .inner
            .request(Operation::Import)?
            .param("KeyName", name)
            .param("PublicKeyMaterial", public_material)
            .build();
        let doc = self
            .inner
            .execute(Operation::Import, CallStyle::Create, name, request)
            .await?
            .ok_or_else(|| AdapterError::fatal(&operation, name, "empty response"))?;

        let Some(fingerprint) = doc.child_text("keyFingerprint") else {
            return Err(AdapterError::fatal(&operation, name, "invalid response to keypair import"));
        };
        let context = self.inner.client().context();
        Ok(Keypair {
            id: name.to_string(),
            name: name.to_string(),
            fingerprint: fingerprint.to_string(),
            owner: context.account.clone(),
            region: context.region.clone(),
            private_key: None,
        })
    }

    /// Delete a keypair; one that does not exist counts as deleted
    pub async fn remove(&self, name: &str) -> Result<()> {
        let request = self.inner.request(Operation::Remove)?.param("KeyName", name).build();
        self.inner
            .execute(Operation::Remove, CallStyle::Remove, name, request)
            .await
            .map(|_| ())
    }

    pub async fn get(&self, name: &str) -> Result<Option<Keypair>> {
        let request = self.inner.request(Operation::Get)?.param("KeyName.1", name).build();
        self.inner.get(name, request, |k| k.name == name).await
    }

    /// Fingerprint of a keypair, `None` when it does not exist
    pub async fn fingerprint(&self, name: &str) -> Result<Option<String>> {
        let operation = format!("{}.fingerprint", ResourceKind::Keypair.label());
        let request = self.inner.request(Operation::Get)?.param("KeyName.1", name).build();
        let Some(doc) = self
            .inner
            .client()
            .call(ResourceKind::Keypair, CallStyle::Lookup, &operation, name, request)
            .await?
        else {
            return Ok(None);
        };
        doc.find_text("keyFingerprint")
            .map(|f| Some(f.to_string()))
            .ok_or_else(|| AdapterError::fatal(&operation, name, "unable to identify key fingerprint"))
    }

    pub async fn list(&self, filter: Option<&KeypairFilter>) -> Result<Vec<Keypair>> {
        let mut template = self.inner.request(Operation::List)?;
        if let Some(filter) = filter {
            template = filter.apply_wire(template);
        }
        self.inner.list(template.build(), filter).await
    }
}

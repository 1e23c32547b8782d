//! The Kernel: guarded transitions over a ledger gateway.
//!
//! Every operation follows the same path: build and validate the record
//! locally, ask the gateway whether the target exists, check the presented
//! grant, then hand the prepared [`Call`] to the gateway. Nothing is cached
//! between operations.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{debug, info, warn};

use anchor_kernel_core::{
    Did, EntityKind, EntryRecord, NamespaceRecord, NetworkScope, RegistryRecord,
    SchemaDefinition, SchemaRecord, Transition, Uri, ValidationError,
};
use anchor_kernel_gateway::{Call, Confirmation, KeyContext, LedgerGateway, Signer};
use anchor_kernel_perms::{AuthorizationGrant, Permissions};

use crate::config::KernelConfig;
use crate::error::Result;

/// The main Kernel struct.
///
/// Holds the gateway, the signing capability and the account it signs for.
/// There is no global ledger handle; every kernel is an explicit context.
pub struct Kernel<G: LedgerGateway> {
    gateway: Arc<G>,
    signer: Arc<dyn Signer>,
    key: KeyContext,
    config: KernelConfig,
    scope: NetworkScope,
}

impl<G: LedgerGateway> Kernel<G> {
    /// Create a new kernel acting as `key.account`.
    pub fn new(
        gateway: Arc<G>,
        signer: Arc<dyn Signer>,
        key: KeyContext,
        config: KernelConfig,
    ) -> Result<Self> {
        config.validate()?;
        let scope = config.scope()?;
        Ok(Self {
            gateway,
            signer,
            key,
            config,
            scope,
        })
    }

    /// The account this kernel signs for.
    pub fn account(&self) -> &Did {
        &self.key.account
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn scope(&self) -> &NetworkScope {
        &self.scope
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Containers
    // ─────────────────────────────────────────────────────────────────────────

    /// Anchor a namespace. The caller becomes its root grant holder.
    pub async fn create_namespace(&self, content: &Json) -> Result<NamespaceRecord> {
        let record = NamespaceRecord::build(content, self.account(), &self.scope)?;
        self.ensure_absent(&record.uri).await?;

        self.dispatch(Call::CreateNamespace {
            uri: record.uri.clone(),
            authorization: record.authorization.clone(),
            digest: record.digest,
            blob: record.blob.clone(),
        })
        .await?;
        Ok(record)
    }

    /// Hand `permissions` over a namespace to `to`.
    pub async fn add_namespace_delegate(
        &self,
        authorization: &AuthorizationGrant,
        to: &Did,
        permissions: Permissions,
    ) -> Result<AuthorizationGrant> {
        let grant = authorization.delegate(to, permissions)?;
        self.ensure_exists(&authorization.scope).await?;
        self.ensure_absent(&grant.uri).await?;
        authorization.authorize(self.account(), &authorization.scope, Permissions::NONE)?;

        self.dispatch(Call::AddNamespaceDelegate {
            grant: grant.clone(),
            authorization: authorization.uri.clone(),
        })
        .await?;
        Ok(grant)
    }

    /// Anchor a registry inside `namespace`, optionally bound to a schema.
    pub async fn create_registry(
        &self,
        namespace: &Uri,
        authorization: &AuthorizationGrant,
        content: &Json,
        schema: Option<&Uri>,
    ) -> Result<RegistryRecord> {
        let record =
            RegistryRecord::build(content, namespace, schema, self.account(), &self.scope)?;
        self.ensure_exists(namespace).await?;
        if let Some(schema) = schema {
            self.ensure_exists(schema).await?;
        }
        self.ensure_absent(&record.uri).await?;
        authorization.authorize(self.account(), namespace, Permissions::ASSERT)?;

        self.dispatch(Call::CreateRegistry {
            uri: record.uri.clone(),
            namespace: namespace.clone(),
            schema: record.schema.clone(),
            authorization: authorization.uri.clone(),
            digest: record.digest,
            blob: record.blob.clone(),
        })
        .await?;
        Ok(record)
    }

    /// Hand `permissions` over a registry to `to`.
    ///
    /// `authorization` is either a grant over the registry itself or an
    /// ADMIN grant over the namespace the registry lives in.
    pub async fn add_registry_delegate(
        &self,
        registry: &RegistryRecord,
        authorization: &AuthorizationGrant,
        to: &Did,
        permissions: Permissions,
    ) -> Result<AuthorizationGrant> {
        let grant = if authorization.scope == registry.uri {
            authorization.delegate(to, permissions)?
        } else {
            authorization.delegate_into(&registry.uri, &registry.namespace, to, permissions)?
        };
        self.ensure_exists(&registry.uri).await?;
        self.ensure_absent(&grant.uri).await?;
        authorization.authorize(self.account(), &authorization.scope, Permissions::NONE)?;

        self.dispatch(Call::AddRegistryDelegate {
            grant: grant.clone(),
            authorization: authorization.uri.clone(),
        })
        .await?;
        Ok(grant)
    }

    /// Anchor a schema inside `namespace`.
    pub async fn create_schema(
        &self,
        namespace: &Uri,
        authorization: &AuthorizationGrant,
        definition: &SchemaDefinition,
    ) -> Result<SchemaRecord> {
        let record = SchemaRecord::build(definition, namespace, self.account(), &self.scope)?;
        record.validate()?;
        self.ensure_exists(namespace).await?;
        self.ensure_absent(&record.uri).await?;
        authorization.authorize(self.account(), namespace, Permissions::ASSERT)?;

        self.dispatch(Call::CreateSchema {
            uri: record.uri.clone(),
            namespace: namespace.clone(),
            authorization: authorization.uri.clone(),
            digest: record.digest,
            blob: record.blob()?,
        })
        .await?;
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Build and check an entry without touching the ledger.
    ///
    /// `schema` must be the registry's schema when the registry names one.
    pub fn prepare_create_entry(
        &self,
        registry: &RegistryRecord,
        authorization: &AuthorizationGrant,
        content: &Json,
        schema: Option<&SchemaRecord>,
    ) -> Result<(EntryRecord, Call)> {
        self.check_registry_content(registry, schema, content)?;

        let record = EntryRecord::build(
            content,
            &registry.uri,
            self.account(),
            &authorization.uri,
            &self.scope,
        )?;
        let call = Call::CreateEntry {
            uri: record.uri.clone(),
            registry: registry.uri.clone(),
            authorization: authorization.uri.clone(),
            digest: record.digest,
            blob: record.blob.clone(),
        };
        Ok((record, call))
    }

    /// Create an entry owned through `authorization`.
    pub async fn create_entry(
        &self,
        registry: &RegistryRecord,
        authorization: &AuthorizationGrant,
        content: &Json,
        schema: Option<&SchemaRecord>,
    ) -> Result<EntryRecord> {
        let (record, call) = self.prepare_create_entry(registry, authorization, content, schema)?;
        self.guard(&record.uri, Transition::Create).await?;
        authorization.authorize(self.account(), &registry.uri, Permissions::ASSERT)?;

        self.dispatch(call).await?;
        Ok(record)
    }

    /// Replace an entry's content. The revoked flag is left alone.
    ///
    /// `registry` is the entry's registry; its schema binding applies to the
    /// new content exactly as on create.
    pub async fn update_entry(
        &self,
        entry: &EntryRecord,
        registry: &RegistryRecord,
        authorization: &AuthorizationGrant,
        content: &Json,
        schema: Option<&SchemaRecord>,
    ) -> Result<EntryRecord> {
        if entry.registry != registry.uri {
            return Err(ValidationError::RegistryMismatch {
                expected: entry.registry.to_string(),
                got: registry.uri.to_string(),
            }
            .into());
        }
        self.check_registry_content(registry, schema, content)?;
        let updated = entry.with_content(content)?;
        self.guard(&entry.uri, Transition::Update).await?;
        self.authorize_owned(entry, authorization)?;

        self.dispatch(Call::UpdateEntry {
            uri: updated.uri.clone(),
            authorization: authorization.uri.clone(),
            digest: updated.digest,
            blob: updated.blob.clone(),
        })
        .await?;
        Ok(updated)
    }

    pub async fn revoke_entry(
        &self,
        entry: &EntryRecord,
        authorization: &AuthorizationGrant,
    ) -> Result<EntryRecord> {
        self.guard(&entry.uri, Transition::Revoke).await?;
        self.authorize_owned(entry, authorization)?;

        self.dispatch(Call::RevokeEntry {
            uri: entry.uri.clone(),
            authorization: authorization.uri.clone(),
        })
        .await?;
        Ok(EntryRecord {
            revoked: true,
            ..entry.clone()
        })
    }

    /// Clear the revoked flag. Succeeds on an active entry too.
    pub async fn reinstate_entry(
        &self,
        entry: &EntryRecord,
        authorization: &AuthorizationGrant,
    ) -> Result<EntryRecord> {
        self.guard(&entry.uri, Transition::Reinstate).await?;
        self.authorize_owned(entry, authorization)?;

        self.dispatch(Call::ReinstateEntry {
            uri: entry.uri.clone(),
            authorization: authorization.uri.clone(),
        })
        .await?;
        Ok(EntryRecord {
            revoked: false,
            ..entry.clone()
        })
    }

    /// Rebind an entry to a fresh ASSERT grant held by `new_owner`.
    ///
    /// `authorization` is the current owner grant (with DELEGATE) or an
    /// ADMIN grant over the entry's registry.
    pub async fn transfer_entry_ownership(
        &self,
        entry: &EntryRecord,
        authorization: &AuthorizationGrant,
        new_owner: &Did,
    ) -> Result<(EntryRecord, AuthorizationGrant)> {
        let grant = authorization.delegate(new_owner, Permissions::ASSERT)?;
        self.guard(&entry.uri, Transition::TransferOwnership).await?;
        authorization.authorize_transfer(
            self.account(),
            &entry.registry,
            &entry.authorization,
            &grant,
        )?;

        self.dispatch(Call::TransferEntryOwnership {
            uri: entry.uri.clone(),
            authorization: authorization.uri.clone(),
            new_owner: grant.clone(),
        })
        .await?;
        let updated = EntryRecord {
            authorization: grant.uri.clone(),
            ..entry.clone()
        };
        Ok((updated, grant))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Count anchored records of one kind by paging through the ledger.
    pub async fn count_anchored(&self, kind: EntityKind) -> Result<usize> {
        let mut count = 0;
        let mut cursor: Option<Uri> = None;
        loop {
            let page = self
                .gateway
                .query_paged(kind, self.config.page_size, cursor.as_ref())
                .await?;
            count += page.keys.len();
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!(%kind, count, "counted anchored records");
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    /// Check `content` against the schema `registry` is bound to, if any.
    fn check_registry_content(
        &self,
        registry: &RegistryRecord,
        schema: Option<&SchemaRecord>,
        content: &Json,
    ) -> Result<()> {
        if !self.config.validate_before_dispatch {
            return Ok(());
        }
        let Some(expected) = &registry.schema else {
            return Ok(());
        };
        match schema {
            Some(s) if &s.uri == expected => self.check_content(s, content),
            other => Err(ValidationError::SchemaMismatch {
                expected: expected.to_string(),
                got: other.map_or_else(|| "none".to_string(), |s| s.uri.to_string()),
            }
            .into()),
        }
    }

    fn check_content(&self, schema: &SchemaRecord, content: &Json) -> Result<()> {
        let report = schema.definition()?.verify_content(content);
        if !report.is_valid() {
            debug!(schema = %schema.uri, issues = report.issues.len(), "content rejected");
        }
        Ok(report.into_result()?)
    }

    fn authorize_owned(&self, entry: &EntryRecord, authorization: &AuthorizationGrant) -> Result<()> {
        authorization.authorize_owned(
            self.account(),
            &entry.registry,
            &entry.authorization,
            Permissions::ASSERT,
        )?;
        Ok(())
    }

    /// Query the ledger and check the existence precondition of `transition`.
    async fn guard(&self, uri: &Uri, transition: Transition) -> Result<()> {
        let exists = self.gateway.exists(uri).await?;
        debug!(%uri, exists, transition = transition.name(), "existence check");
        transition.check_presence(exists, uri)?;
        Ok(())
    }

    async fn ensure_exists(&self, uri: &Uri) -> Result<()> {
        self.guard(uri, Transition::Update).await
    }

    async fn ensure_absent(&self, uri: &Uri) -> Result<()> {
        self.guard(uri, Transition::Create).await
    }

    async fn dispatch(&self, call: Call) -> Result<Confirmation> {
        let confirmation = self
            .gateway
            .submit(&call, self.signer.as_ref(), &self.key, self.config.confirmation)
            .await
            .map_err(|e| {
                warn!(call = call.name(), uri = %call.target(), error = %e, "dispatch failed");
                e
            })?;
        info!(
            call = call.name(),
            uri = %call.target(),
            tx = %confirmation.tx,
            block = confirmation.block,
            "dispatched"
        );
        Ok(confirmation)
    }
}

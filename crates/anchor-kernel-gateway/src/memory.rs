//! In-memory implementation of the LedgerGateway trait.
//!
//! This is primarily for testing. It enforces the same guards a ledger
//! would: every call is signature-checked, every created record is
//! re-derived from its blob, and every grant is checked against the
//! delegation rules before state changes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use anchor_kernel_core::{
    decode_blob, verify_blob, Did, Digest, EntityKind, EntryRecord, EntryState, NamespaceRecord,
    RegistryRecord, SchemaRecord, Transition, Uri,
};
use anchor_kernel_perms::{AuthorizationGrant, GrantIndex, Permissions};

use crate::call::Call;
use crate::error::{GatewayError, Result};
use crate::signer::{KeyContext, Signer};
use crate::traits::{Confirmation, ConfirmationPolicy, LedgerGateway, Page};

fn rejected(reason: impl std::fmt::Display) -> GatewayError {
    GatewayError::Rejected(reason.to_string())
}

/// In-memory ledger.
///
/// All state is lost when the gateway is dropped. Thread-safe via RwLock.
pub struct MemoryGateway {
    inner: RwLock<MemoryGatewayInner>,
}

struct MemoryGatewayInner {
    namespaces: HashMap<Uri, NamespaceRecord>,
    registries: HashMap<Uri, RegistryRecord>,
    schemas: HashMap<Uri, SchemaRecord>,
    entries: HashMap<Uri, EntryRecord>,
    grants: GrantIndex,

    /// Anchored keys per kind, in URI order for paging.
    keys: BTreeMap<EntityKind, BTreeSet<Uri>>,

    /// Height of the last produced block.
    block: u64,

    /// Blocks that must follow inclusion before a block counts as final.
    finality_depth: u64,

    /// Simulated time per block.
    block_time: Duration,

    /// Injected failure for the next submission.
    fail_next: Option<GatewayError>,

    offline: bool,
}

impl MemoryGateway {
    /// Create an empty ledger that finalizes every block immediately.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryGatewayInner {
                namespaces: HashMap::new(),
                registries: HashMap::new(),
                schemas: HashMap::new(),
                entries: HashMap::new(),
                grants: GrantIndex::new(),
                keys: BTreeMap::new(),
                block: 0,
                finality_depth: 0,
                block_time: Duration::ZERO,
                fail_next: None,
                offline: false,
            }),
        }
    }

    /// Require `depth` further blocks before an inclusion is final.
    pub fn with_finality_depth(self, depth: u64) -> Self {
        self.inner.write().unwrap().finality_depth = depth;
        self
    }

    /// Sleep this long for every block produced.
    pub fn with_block_time(self, block_time: Duration) -> Self {
        self.inner.write().unwrap().block_time = block_time;
        self
    }

    /// Fail the next submission with `error` before it is applied.
    pub fn fail_next_submit(&self, error: GatewayError) {
        self.inner.write().unwrap().fail_next = Some(error);
    }

    /// Make every call return [`GatewayError::Unavailable`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.write().unwrap().offline = offline;
    }

    pub fn entry(&self, uri: &Uri) -> Option<EntryRecord> {
        self.inner.read().unwrap().entries.get(uri).cloned()
    }

    pub fn namespace(&self, uri: &Uri) -> Option<NamespaceRecord> {
        self.inner.read().unwrap().namespaces.get(uri).cloned()
    }

    pub fn registry(&self, uri: &Uri) -> Option<RegistryRecord> {
        self.inner.read().unwrap().registries.get(uri).cloned()
    }

    pub fn schema(&self, uri: &Uri) -> Option<SchemaRecord> {
        self.inner.read().unwrap().schemas.get(uri).cloned()
    }

    pub fn grant(&self, uri: &Uri) -> Option<AuthorizationGrant> {
        self.inner.read().unwrap().grants.get(uri).cloned()
    }

    /// Union of the bits a party holds over a namespace or registry.
    pub fn effective_permissions(&self, scope: &Uri, delegate: &Did) -> Permissions {
        self.inner.read().unwrap().grants.effective(scope, delegate)
    }

    /// Number of anchored records of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.inner
            .read()
            .unwrap()
            .keys
            .get(&kind)
            .map_or(0, BTreeSet::len)
    }

    pub fn block_height(&self) -> u64 {
        self.inner.read().unwrap().block
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGatewayInner {
    fn contains(&self, uri: &Uri) -> bool {
        self.keys
            .get(&uri.kind())
            .map_or(false, |keys| keys.contains(uri))
    }

    fn anchor(&mut self, uri: &Uri) {
        self.keys.entry(uri.kind()).or_default().insert(uri.clone());
    }

    fn ensure_absent(&self, uri: &Uri) -> Result<()> {
        if self.contains(uri) {
            return Err(rejected(format!("{uri} already exists")));
        }
        Ok(())
    }

    fn presented(&self, authorization: &Uri) -> Result<&AuthorizationGrant> {
        self.grants
            .get(authorization)
            .ok_or_else(|| rejected(format!("unknown grant {authorization}")))
    }

    fn record_grant(&mut self, grant: AuthorizationGrant) -> Result<()> {
        let uri = grant.uri.clone();
        self.grants.insert(grant).map_err(rejected)?;
        self.anchor(&uri);
        Ok(())
    }

    /// Registry and owner grant of an entry, after checking `transition`
    /// is allowed from its current state.
    fn entry_owner(&self, uri: &Uri, transition: Transition) -> Result<(Uri, Uri, EntryState)> {
        let entry = self.entries.get(uri);
        let next = EntryState::of(entry).apply(transition, uri).map_err(rejected)?;
        let entry = entry.ok_or_else(|| rejected(format!("no entry {uri}")))?;
        Ok((entry.registry.clone(), entry.authorization.clone(), next))
    }

    /// Check the guards for `call` and apply it.
    fn apply(&mut self, call: &Call, signer: &Did) -> Result<()> {
        match call {
            Call::CreateNamespace {
                uri,
                authorization,
                digest,
                blob,
            } => {
                self.ensure_absent(uri)?;
                let content = decode_blob(blob).map_err(rejected)?;
                let record = NamespaceRecord::build(&content, signer, uri.scope()).map_err(rejected)?;
                if &record.uri != uri || &record.authorization != authorization || &record.digest != digest {
                    return Err(rejected("namespace does not match its content"));
                }
                self.record_grant(AuthorizationGrant::root(uri, signer).map_err(rejected)?)?;
                self.anchor(uri);
                self.namespaces.insert(uri.clone(), record);
            }

            Call::AddNamespaceDelegate {
                grant,
                authorization,
            } => {
                if !self.namespaces.contains_key(&grant.scope) {
                    return Err(rejected(format!("no namespace {}", grant.scope)));
                }
                self.ensure_absent(&grant.uri)?;
                let held = self.presented(authorization)?;
                held.authorize(signer, &grant.scope, Permissions::NONE)
                    .map_err(rejected)?;
                held.admits(grant, None).map_err(rejected)?;
                self.record_grant(grant.clone())?;
            }

            Call::CreateRegistry {
                uri,
                namespace,
                schema,
                authorization,
                digest,
                blob,
            } => {
                self.ensure_absent(uri)?;
                if !self.namespaces.contains_key(namespace) {
                    return Err(rejected(format!("no namespace {namespace}")));
                }
                if let Some(schema) = schema {
                    if !self.schemas.contains_key(schema) {
                        return Err(rejected(format!("no schema {schema}")));
                    }
                }
                self.presented(authorization)?
                    .authorize(signer, namespace, Permissions::ASSERT)
                    .map_err(rejected)?;

                let content = decode_blob(blob).map_err(rejected)?;
                let record =
                    RegistryRecord::build(&content, namespace, schema.as_ref(), signer, uri.scope())
                        .map_err(rejected)?;
                if &record.uri != uri || &record.digest != digest {
                    return Err(rejected("registry does not match its content"));
                }
                self.record_grant(AuthorizationGrant::root(uri, signer).map_err(rejected)?)?;
                self.anchor(uri);
                self.registries.insert(uri.clone(), record);
            }

            Call::AddRegistryDelegate {
                grant,
                authorization,
            } => {
                let registry_namespace = self
                    .registries
                    .get(&grant.scope)
                    .map(|r| r.namespace.clone())
                    .ok_or_else(|| rejected(format!("no registry {}", grant.scope)))?;
                self.ensure_absent(&grant.uri)?;
                let held = self.presented(authorization)?;
                held.authorize(signer, &held.scope, Permissions::NONE)
                    .map_err(rejected)?;
                held.admits(grant, Some(&registry_namespace))
                    .map_err(rejected)?;
                self.record_grant(grant.clone())?;
            }

            Call::CreateSchema {
                uri,
                namespace,
                authorization,
                digest,
                blob,
            } => {
                self.ensure_absent(uri)?;
                if !self.namespaces.contains_key(namespace) {
                    return Err(rejected(format!("no namespace {namespace}")));
                }
                self.presented(authorization)?
                    .authorize(signer, namespace, Permissions::ASSERT)
                    .map_err(rejected)?;
                let record =
                    SchemaRecord::from_blob(blob, uri, namespace, signer).map_err(rejected)?;
                if &record.digest != digest {
                    return Err(rejected("schema digest does not match its blob"));
                }
                self.anchor(uri);
                self.schemas.insert(uri.clone(), record);
            }

            Call::CreateEntry {
                uri,
                registry,
                authorization,
                digest,
                blob,
            } => {
                self.ensure_absent(uri)?;
                if !self.registries.contains_key(registry) {
                    return Err(rejected(format!("no registry {registry}")));
                }
                self.presented(authorization)?
                    .authorize(signer, registry, Permissions::ASSERT)
                    .map_err(rejected)?;
                let content = decode_blob(blob).map_err(rejected)?;
                let record = EntryRecord::build(&content, registry, signer, authorization, uri.scope())
                    .map_err(rejected)?;
                if &record.uri != uri || &record.digest != digest {
                    return Err(rejected("entry does not match its content"));
                }
                self.anchor(uri);
                self.entries.insert(uri.clone(), record);
            }

            Call::UpdateEntry {
                uri,
                authorization,
                digest,
                blob,
            } => {
                let (registry, owner, _) = self.entry_owner(uri, Transition::Update)?;
                self.presented(authorization)?
                    .authorize_owned(signer, &registry, &owner, Permissions::ASSERT)
                    .map_err(rejected)?;
                verify_blob(blob, digest).map_err(rejected)?;
                decode_blob(blob).map_err(rejected)?;
                if let Some(entry) = self.entries.get_mut(uri) {
                    entry.digest = *digest;
                    entry.blob = blob.clone();
                }
            }

            Call::RevokeEntry { uri, authorization } | Call::ReinstateEntry { uri, authorization } => {
                let transition = if matches!(call, Call::RevokeEntry { .. }) {
                    Transition::Revoke
                } else {
                    Transition::Reinstate
                };
                let (registry, owner, next) = self.entry_owner(uri, transition)?;
                self.presented(authorization)?
                    .authorize_owned(signer, &registry, &owner, Permissions::ASSERT)
                    .map_err(rejected)?;
                if let Some(entry) = self.entries.get_mut(uri) {
                    entry.revoked = next == EntryState::Revoked;
                }
            }

            Call::TransferEntryOwnership {
                uri,
                authorization,
                new_owner,
            } => {
                let (registry, owner, _) = self.entry_owner(uri, Transition::TransferOwnership)?;
                self.presented(authorization)?
                    .authorize_transfer(signer, &registry, &owner, new_owner)
                    .map_err(rejected)?;
                if !self.grants.contains(&new_owner.uri) {
                    self.record_grant(new_owner.clone())?;
                }
                if let Some(entry) = self.entries.get_mut(uri) {
                    entry.authorization = new_owner.uri.clone();
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for MemoryGateway {
    async fn exists(&self, uri: &Uri) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        if inner.offline {
            return Err(GatewayError::Unavailable("memory ledger is offline".into()));
        }
        Ok(inner.contains(uri))
    }

    async fn submit(
        &self,
        call: &Call,
        signer: &dyn Signer,
        key: &KeyContext,
        policy: ConfirmationPolicy,
    ) -> Result<Confirmation> {
        let bytes = call.to_bytes()?;
        let signature = signer.sign(&bytes, key).await?;
        if key.account.verify(&bytes, &signature).is_err() {
            warn!(call = call.name(), account = %key.account, "bad signature");
            return Err(rejected("signature does not match the submitting account"));
        }

        let (confirmation, wait) = {
            let mut inner = self.inner.write().unwrap();
            if inner.offline {
                return Err(GatewayError::Unavailable("memory ledger is offline".into()));
            }
            if let Some(err) = inner.fail_next.take() {
                warn!(call = call.name(), error = %err, "injected failure");
                return Err(err);
            }

            if let Err(err) = inner.apply(call, &key.account) {
                warn!(call = call.name(), target = %call.target(), error = %err, "call rejected");
                return Err(err);
            }

            inner.block += 1;
            let included = inner.block;
            let mut blocks: u64 = 1;
            let finalized = match policy {
                ConfirmationPolicy::InBlock => inner.finality_depth == 0,
                ConfirmationPolicy::Finalized => {
                    inner.block = inner.block.saturating_add(inner.finality_depth);
                    blocks = blocks.saturating_add(inner.finality_depth);
                    true
                }
            };

            let confirmation = Confirmation {
                tx: Digest::hash_parts(&[bytes.as_slice(), signature.as_bytes().as_slice()]),
                block: included,
                finalized,
            };
            (confirmation, settle_time(inner.block_time, blocks))
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        info!(
            call = call.name(),
            target = %call.target(),
            block = confirmation.block,
            finalized = confirmation.finalized,
            "call included"
        );
        Ok(confirmation)
    }

    async fn query_paged(
        &self,
        kind: EntityKind,
        page_size: usize,
        cursor: Option<&Uri>,
    ) -> Result<Page> {
        if page_size == 0 {
            return Err(rejected("page size must be positive"));
        }
        let inner = self.inner.read().unwrap();
        if inner.offline {
            return Err(GatewayError::Unavailable("memory ledger is offline".into()));
        }

        let Some(keys) = inner.keys.get(&kind) else {
            return Ok(Page::default());
        };
        let start = match cursor {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Unbounded,
        };
        let mut keys: Vec<Uri> = keys
            .range::<Uri, _>((start, Bound::Unbounded))
            .take(page_size + 1)
            .cloned()
            .collect();

        let next = if keys.len() > page_size {
            keys.truncate(page_size);
            keys.last().cloned()
        } else {
            None
        };
        debug!(%kind, returned = keys.len(), more = next.is_some(), "paged query");
        Ok(Page { keys, next })
    }
}

/// Simulated wait for `blocks` blocks, saturating rather than wrapping.
fn settle_time(block_time: Duration, blocks: u64) -> Duration {
    block_time.saturating_mul(u32::try_from(blocks).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::KeypairSigner;
    use anchor_kernel_core::{canonicalize, Keypair, NetworkScope};
    use serde_json::json;

    fn party(seed: u8) -> KeypairSigner {
        KeypairSigner::new(Keypair::from_seed(&[seed; 32]))
    }

    async fn submit(gw: &MemoryGateway, who: &KeypairSigner, call: Call) -> Result<Confirmation> {
        gw.submit(&call, who, &who.key_context(), ConfirmationPolicy::InBlock)
            .await
    }

    fn namespace_call(who: &KeypairSigner) -> (NamespaceRecord, Call) {
        let record = NamespaceRecord::build(&json!({"name": "ns"}), &who.did(), &NetworkScope::default())
            .unwrap();
        let call = Call::CreateNamespace {
            uri: record.uri.clone(),
            authorization: record.authorization.clone(),
            digest: record.digest,
            blob: record.blob.clone(),
        };
        (record, call)
    }

    async fn registry(gw: &MemoryGateway, who: &KeypairSigner) -> RegistryRecord {
        let (ns, call) = namespace_call(who);
        submit(gw, who, call).await.unwrap();
        let record = RegistryRecord::build(
            &json!({"name": "reg"}),
            &ns.uri,
            None,
            &who.did(),
            &NetworkScope::default(),
        )
        .unwrap();
        let call = Call::CreateRegistry {
            uri: record.uri.clone(),
            namespace: ns.uri.clone(),
            schema: None,
            authorization: ns.authorization.clone(),
            digest: record.digest,
            blob: record.blob.clone(),
        };
        submit(gw, who, call).await.unwrap();
        record
    }

    fn entry_call(reg: &RegistryRecord, who: &KeypairSigner, authorization: &Uri) -> (EntryRecord, Call) {
        let entry = EntryRecord::build(
            &json!({"v": 1}),
            &reg.uri,
            &who.did(),
            authorization,
            &NetworkScope::default(),
        )
        .unwrap();
        let call = Call::CreateEntry {
            uri: entry.uri.clone(),
            registry: reg.uri.clone(),
            authorization: authorization.clone(),
            digest: entry.digest,
            blob: entry.blob.clone(),
        };
        (entry, call)
    }

    #[tokio::test]
    async fn test_create_namespace_and_exists() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let (record, call) = namespace_call(&alice);

        assert!(!gw.exists(&record.uri).await.unwrap());
        let confirmation = submit(&gw, &alice, call.clone()).await.unwrap();
        assert_eq!(confirmation.block, 1);
        assert!(confirmation.finalized);
        assert!(gw.exists(&record.uri).await.unwrap());
        assert!(gw.exists(&record.authorization).await.unwrap());
        assert_eq!(
            gw.effective_permissions(&record.uri, &alice.did()),
            Permissions::ALL
        );

        // Duplicate
        assert!(matches!(
            submit(&gw, &alice, call).await,
            Err(GatewayError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_content_mismatch() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let (record, _) = namespace_call(&alice);
        let other = canonicalize(&json!({"name": "other"})).unwrap();
        let call = Call::CreateNamespace {
            uri: record.uri,
            authorization: record.authorization,
            digest: record.digest,
            blob: other.to_blob(),
        };
        assert!(matches!(
            submit(&gw, &alice, call).await,
            Err(GatewayError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_entry_lifecycle_guards() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let reg = registry(&gw, &alice).await;
        let (entry, call) = entry_call(&reg, &alice, &reg.authorization);
        submit(&gw, &alice, call).await.unwrap();

        let revoke = Call::RevokeEntry {
            uri: entry.uri.clone(),
            authorization: reg.authorization.clone(),
        };
        submit(&gw, &alice, revoke.clone()).await.unwrap();
        submit(&gw, &alice, revoke).await.unwrap();
        assert!(gw.entry(&entry.uri).unwrap().revoked);

        let reinstate = Call::ReinstateEntry {
            uri: entry.uri.clone(),
            authorization: reg.authorization.clone(),
        };
        submit(&gw, &alice, reinstate.clone()).await.unwrap();
        submit(&gw, &alice, reinstate).await.unwrap();
        assert!(!gw.entry(&entry.uri).unwrap().revoked);
    }

    #[tokio::test]
    async fn test_stranger_cannot_use_foreign_grant() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let mallory = party(9);
        let reg = registry(&gw, &alice).await;
        let (_, call) = entry_call(&reg, &mallory, &reg.authorization);
        assert!(matches!(
            submit(&gw, &mallory, call).await,
            Err(GatewayError::Rejected(_))
        ));
        assert_eq!(gw.count(EntityKind::Entry), 0);
    }

    #[tokio::test]
    async fn test_delegate_then_assert() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let bob = party(2);
        let reg = registry(&gw, &alice).await;
        let root = gw.grant(&reg.authorization).unwrap();
        let grant = root.delegate(&bob.did(), Permissions::ASSERT).unwrap();

        submit(
            &gw,
            &alice,
            Call::AddRegistryDelegate {
                grant: grant.clone(),
                authorization: root.uri.clone(),
            },
        )
        .await
        .unwrap();

        let (entry, call) = entry_call(&reg, &bob, &grant.uri);
        submit(&gw, &bob, call).await.unwrap();
        assert_eq!(gw.entry(&entry.uri).unwrap().authorization, grant.uri);
    }

    #[tokio::test]
    async fn test_paging() {
        let gw = MemoryGateway::new();
        for seed in 1..=5 {
            let who = party(seed);
            let (_, call) = namespace_call(&who);
            submit(&gw, &who, call).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = gw
                .query_paged(EntityKind::Namespace, 2, cursor.as_ref())
                .await
                .unwrap();
            assert!(page.keys.len() <= 2);
            seen.extend(page.keys);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(seen.len(), 5);
        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(seen, sorted);

        assert!(gw.query_paged(EntityKind::Entry, 2, None).await.unwrap().keys.is_empty());
        assert!(gw.query_paged(EntityKind::Entry, 0, None).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_and_offline() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let (record, call) = namespace_call(&alice);

        gw.fail_next_submit(GatewayError::Timeout("finality".into()));
        assert!(matches!(
            submit(&gw, &alice, call.clone()).await,
            Err(GatewayError::Timeout(_))
        ));
        assert!(!gw.exists(&record.uri).await.unwrap());

        gw.set_offline(true);
        assert!(matches!(
            gw.exists(&record.uri).await,
            Err(GatewayError::Unavailable(_))
        ));
        gw.set_offline(false);
        submit(&gw, &alice, call).await.unwrap();
    }

    #[tokio::test]
    async fn test_finality_depth() {
        let gw = MemoryGateway::new().with_finality_depth(3);
        let alice = party(1);
        let bob = party(2);

        let (_, call) = namespace_call(&alice);
        let c = submit(&gw, &alice, call).await.unwrap();
        assert!(!c.finalized);

        let (_, call) = namespace_call(&bob);
        let c = gw
            .submit(&call, &bob, &bob.key_context(), ConfirmationPolicy::Finalized)
            .await
            .unwrap();
        assert!(c.finalized);
        assert_eq!(c.block, 2);
        assert_eq!(gw.block_height(), 5);
    }

    #[test]
    fn test_settle_time_saturates() {
        let ms = Duration::from_millis(1);
        assert_eq!(settle_time(ms, 3), Duration::from_millis(3));
        assert_eq!(settle_time(ms, 1 << 32), ms * u32::MAX);
        assert_eq!(settle_time(ms, u64::MAX), ms * u32::MAX);
        assert_eq!(settle_time(Duration::ZERO, u64::MAX), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_huge_finality_depth_does_not_overflow() {
        let gw = MemoryGateway::new().with_finality_depth(u64::MAX);
        let alice = party(1);
        let (_, call) = namespace_call(&alice);
        let c = gw
            .submit(&call, &alice, &alice.key_context(), ConfirmationPolicy::Finalized)
            .await
            .unwrap();
        assert!(c.finalized);
        assert_eq!(c.block, 1);
        assert_eq!(gw.block_height(), u64::MAX);
    }

    #[tokio::test]
    async fn test_signer_account_mismatch() {
        let gw = MemoryGateway::new();
        let alice = party(1);
        let (_, call) = namespace_call(&alice);
        let foreign = party(2).key_context();
        assert!(matches!(
            gw.submit(&call, &alice, &foreign, ConfirmationPolicy::InBlock).await,
            Err(GatewayError::Signing(_))
        ));
    }
}

//! Shared test helpers for engine tests.

#![allow(dead_code)]

use fieldveil_config::{
    CacheConfig, ConfigCache, ContextRow, FieldRuleRow, InMemoryLoader, SortRuleRow, TransformRow,
};
use fieldveil_crypto::{AtRestCodec, CodecKey, ReferenceCryptoProvider};
use fieldveil_engine::{HandleProvider, MemoryAuditSink, TransformService};
use fieldveil_types::{Operation, SortDirection};
use std::sync::Arc;

/// One wired-up core: feed, codec, cache, provider, audit collector and the
/// service facade over them.
pub struct Fixture {
    pub loader: Arc<InMemoryLoader>,
    pub codec: Arc<AtRestCodec>,
    pub cache: Arc<ConfigCache>,
    pub provider: Arc<HandleProvider>,
    pub audit: Arc<MemoryAuditSink>,
    pub service: TransformService,
}

impl Fixture {
    /// Empty feed; populate via the helpers, then `init()`.
    pub fn new() -> Self {
        let loader = Arc::new(InMemoryLoader::new());
        let codec = Arc::new(AtRestCodec::new(CodecKey::from_bytes([42u8; 32])));
        let cache = Arc::new(ConfigCache::new(
            Arc::clone(&loader) as _,
            Arc::clone(&codec),
            CacheConfig::default(),
        ));
        let provider = Arc::new(HandleProvider::new(
            Arc::new(ReferenceCryptoProvider::new()),
            Arc::clone(&loader) as _,
            Arc::clone(&codec),
        ));
        let audit = Arc::new(MemoryAuditSink::new());
        let service = TransformService::new(
            Arc::clone(&cache),
            Arc::clone(&provider),
            Arc::clone(&audit) as _,
        );
        Self {
            loader,
            codec,
            cache,
            provider,
            audit,
            service,
        }
    }

    /// Adds the default context `ctx-main`.
    pub fn add_context(&self) {
        self.loader.put_context(ContextRow {
            context_id: "ctx-main".into(),
            policy_ref: self.codec.conceal("https://policy.example/api").unwrap(),
            trust_anchor: "roots.pem".to_string(),
            client_identity: "svc-fieldveil".to_string(),
        });
    }

    /// Adds a transform definition under `ctx-main`.
    pub fn add_transform(&self, transform_id: &str) {
        self.loader.put_transform(TransformRow {
            transform_id: transform_id.into(),
            context_id: "ctx-main".into(),
            format: self.codec.conceal("generic").unwrap(),
            shared_secret: self.codec.conceal(&format!("secret-{transform_id}")).unwrap(),
            identity: self.codec.conceal("id-1").unwrap(),
        });
    }

    /// Adds profile rules as (path, operation, transform id) triples.
    pub fn add_profile(&self, profile_id: &str, rules: &[(&str, Operation, &str)]) {
        let rows = rules
            .iter()
            .map(|(path, operation, transform_id)| FieldRuleRow {
                path: self.codec.conceal(path).unwrap(),
                operation: *operation,
                transform_id: (*transform_id).into(),
            })
            .collect();
        self.loader.put_rules(profile_id, rows);
    }

    /// Adds an enabled sort rule to a profile.
    pub fn add_sort_rule(&self, profile_id: &str, field: &str, direction: SortDirection) {
        self.loader.put_sort_rule(
            profile_id,
            SortRuleRow {
                enabled: true,
                field: self.codec.conceal(field).unwrap(),
                direction,
            },
        );
    }

    /// First build of the handle set.
    pub fn init(&self) {
        self.provider.initialize().unwrap();
    }

    /// The usual single-context, single-transform setup.
    pub fn standard() -> Self {
        let fixture = Self::new();
        fixture.add_context();
        fixture.add_transform("T1");
        fixture.init();
        fixture
    }
}

use felt_gameplay::PlayerId;
use std::collections::HashMap;
use std::sync::RwLock;

/// An authenticated bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: PlayerId,
    pub name: String,
}

/// Credential lookup seam.
///
/// Bot registration is an admin-surface concern; the dispatcher only needs
/// to verify a presented id/key pair.
#[async_trait::async_trait]
pub trait BotDirectory: Send + Sync {
    async fn verify(&self, bot_id: &str, api_key: &str) -> Option<BotIdentity>;
}

struct BotRecord {
    name: String,
    api_key: String,
}

/// In-memory directory for development and tests.
#[derive(Default)]
pub struct MemoryDirectory {
    bots: RwLock<HashMap<PlayerId, BotRecord>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers a bot and returns its id and freshly minted key.
    pub fn register(&self, name: impl Into<String>) -> (PlayerId, String) {
        let id = PlayerId::default();
        let api_key = uuid::Uuid::new_v4().to_string();
        self.bots.write().expect("directory lock").insert(
            id,
            BotRecord {
                name: name.into(),
                api_key: api_key.clone(),
            },
        );
        (id, api_key)
    }
}

#[async_trait::async_trait]
impl BotDirectory for MemoryDirectory {
    async fn verify(&self, bot_id: &str, api_key: &str) -> Option<BotIdentity> {
        let id: PlayerId = bot_id.parse().ok()?;
        let bots = self.bots.read().expect("directory lock");
        let record = bots.get(&id)?;
        match record.api_key == api_key {
            true => Some(BotIdentity {
                id,
                name: record.name.clone(),
            }),
            false => None,
        }
    }
}

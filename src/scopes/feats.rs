use crate::client::GuildClient;
use crate::db::collection::Filter;
use crate::error::StoreError;
use crate::models::Feat;
use crate::transaction::TransactionOutcome;

#[derive(Clone)]
pub struct FeatScope {
    client: GuildClient,
}

impl FeatScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    pub async fn get_all_feats(&self, guild_id: &str) -> Result<Vec<Feat>, StoreError> {
        self.client
            .guild_db(guild_id)?
            .collection::<Feat>()
            .find(&Filter::All, None)
            .await
    }

    /// Replace every feat of the guild with `feats`, atomically.
    pub async fn rewrite_all_feats(
        &self,
        guild_id: &str,
        feats: Vec<Feat>,
    ) -> Result<TransactionOutcome, StoreError> {
        super::rewrite_collection(&self.client, guild_id, feats).await
    }
}

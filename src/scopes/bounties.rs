use crate::client::GuildClient;
use crate::db::collection::Filter;
use crate::error::StoreError;
use crate::models::Bounty;
use crate::transaction::TransactionOutcome;

#[derive(Clone)]
pub struct BountyScope {
    client: GuildClient,
}

impl BountyScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    pub async fn get_all_bounties(&self, guild_id: &str) -> Result<Vec<Bounty>, StoreError> {
        self.client
            .guild_db(guild_id)?
            .collection::<Bounty>()
            .find(&Filter::All, None)
            .await
    }

    pub async fn rewrite_all_bounties(
        &self,
        guild_id: &str,
        bounties: Vec<Bounty>,
    ) -> Result<TransactionOutcome, StoreError> {
        super::rewrite_collection(&self.client, guild_id, bounties).await
    }
}

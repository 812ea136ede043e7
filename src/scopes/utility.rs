use crate::client::GuildClient;
use crate::db::collection::Filter;
use crate::error::StoreError;
use crate::models::{AnnouncementBatch, BuildingMessage, ExpTable, ProficiencyList, ProficiencyStub};
use crate::registry::GuildDb;
use crate::session::GuildSession;

/// Guild-wide lookup tables and bot bookkeeping documents.
#[derive(Clone)]
pub struct UtilityScope {
    client: GuildClient,
}

impl UtilityScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    fn db(&self, guild_id: &str) -> Result<&GuildDb, StoreError> {
        self.client.guild_db(guild_id)
    }

    pub async fn get_exp_table(
        &self,
        guild_id: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<ExpTable, StoreError> {
        self.db(guild_id)?
            .collection::<ExpTable>()
            .get(ExpTable::UTIL_TYPE, session)
            .await
    }

    /// Known proficiencies; empty when the guild has none configured.
    pub async fn get_proficiencies(&self, guild_id: &str) -> Result<Vec<ProficiencyStub>, StoreError> {
        Ok(self
            .db(guild_id)?
            .collection::<ProficiencyList>()
            .find_by_id(ProficiencyList::UTIL_TYPE, None)
            .await?
            .map(|list| list.values)
            .unwrap_or_default())
    }

    pub async fn get_announcements(
        &self,
        guild_id: &str,
        batch_id: &str,
    ) -> Result<AnnouncementBatch, StoreError> {
        self.db(guild_id)?
            .collection::<AnnouncementBatch>()
            .get(batch_id, None)
            .await
    }

    /// Store `batch` under `batch_id`, creating it if needed.
    pub async fn update_announcements(
        &self,
        guild_id: &str,
        batch_id: &str,
        mut batch: AnnouncementBatch,
    ) -> Result<bool, StoreError> {
        batch.id = batch_id.to_string();
        self.db(guild_id)?
            .collection::<AnnouncementBatch>()
            .upsert_one(&batch, None)
            .await
            .map(|written| written.is_successful())
    }

    pub async fn get_buildings_messages(
        &self,
        guild_id: &str,
    ) -> Result<Vec<BuildingMessage>, StoreError> {
        self.db(guild_id)?
            .collection::<BuildingMessage>()
            .find(&Filter::All, None)
            .await
    }

    pub async fn update_building_message(
        &self,
        guild_id: &str,
        message: &BuildingMessage,
    ) -> Result<bool, StoreError> {
        self.db(guild_id)?
            .collection::<BuildingMessage>()
            .upsert_one(message, None)
            .await
            .map(|written| written.is_successful())
    }
}

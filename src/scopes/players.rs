use crate::client::GuildClient;
use crate::db::collection::Collection;
use crate::error::StoreError;
use crate::models::Player;
use crate::session::GuildSession;

#[derive(Clone)]
pub struct PlayerScope {
    client: GuildClient,
}

impl PlayerScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    fn collection(&self, guild_id: &str) -> Result<Collection<Player>, StoreError> {
        Ok(self.client.guild_db(guild_id)?.collection())
    }

    pub async fn get_player(
        &self,
        guild_id: &str,
        player_id: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<Option<Player>, StoreError> {
        self.collection(guild_id)?.find_by_id(player_id, session).await
    }

    /// Insert a new player; fails if the id is taken.
    pub async fn create_player(
        &self,
        guild_id: &str,
        player_id: &str,
        name: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<Player, StoreError> {
        let player = Player::new(player_id, name);
        self.collection(guild_id)?.insert_one(&player, session).await?;
        Ok(player)
    }

    pub async fn set_active_character(
        &self,
        guild_id: &str,
        player_id: &str,
        character_id: Option<String>,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.collection(guild_id)?
            .modify_one(player_id, session, move |mut player| {
                player.active_character = character_id;
                player
            })
            .await
            .map(|written| written.is_single())
    }
}

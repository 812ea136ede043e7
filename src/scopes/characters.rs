use crate::client::GuildClient;
use crate::db::collection::{Collection, Filter, json_path};
use crate::error::StoreError;
use crate::models::{
    ActiveCharacterOrAllActive, BaseBuilding, Building, Character, CharacterCreationData,
    CharacterStatus, CharacterWithPlayer, Errata, Player, ProficiencyStub,
};
use crate::session::GuildSession;
use crate::transaction::TransactionOutcome;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone)]
pub struct CharacterScope {
    client: GuildClient,
}

fn status_filter(status: CharacterStatus) -> Result<Filter, StoreError> {
    Ok(Filter::eq("status", serde_json::to_value(status)?))
}

/// Item names are inventory keys and must be addressable as a JSON path
/// segment: non-empty and free of `"`.
fn check_item_name(item: &str) -> Result<(), StoreError> {
    json_path([item]).map(|_| ())
}

impl CharacterScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    fn collection(&self, guild_id: &str) -> Result<Collection<Character>, StoreError> {
        Ok(self.client.guild_db(guild_id)?.collection())
    }

    /// The character `character_id`, or `ResourceNotFound`.
    pub async fn get_character(
        &self,
        guild_id: &str,
        character_id: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<Character, StoreError> {
        self.collection(guild_id)?.get(character_id, session).await
    }

    /// Characters whose id is in `character_ids`; unknown ids are ignored.
    pub async fn get_characters(
        &self,
        guild_id: &str,
        character_ids: &[String],
    ) -> Result<Vec<Character>, StoreError> {
        self.collection(guild_id)?
            .find(&Filter::is_in("id", character_ids.iter().map(String::as_str)), None)
            .await
    }

    pub async fn get_active_characters(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> Result<Vec<Character>, StoreError> {
        let filter = Filter::and([status_filter(CharacterStatus::Active)?, Filter::eq("player", player_id)]);
        self.collection(guild_id)?.find(&filter, None).await
    }

    /// The player's selected active character if it exists; otherwise the only
    /// active character, or all of them when there is not exactly one.
    pub async fn get_active_character_or_all_active(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> Result<ActiveCharacterOrAllActive, StoreError> {
        let selected = self
            .client
            .players()
            .get_player(guild_id, player_id, None)
            .await?
            .and_then(|player| player.active_character);
        if let Some(character_id) = selected {
            if let Some(character) = self.collection(guild_id)?.find_by_id(&character_id, None).await? {
                return Ok(ActiveCharacterOrAllActive::Current(character));
            }
        }

        let mut active = self.get_active_characters(guild_id, player_id).await?;
        Ok(match active.pop() {
            Some(only) if active.is_empty() => ActiveCharacterOrAllActive::Current(only),
            Some(last) => {
                active.push(last);
                ActiveCharacterOrAllActive::AllActive(active)
            }
            None => ActiveCharacterOrAllActive::AllActive(Vec::new()),
        })
    }

    pub async fn get_all_characters(
        &self,
        guild_id: &str,
        status: Option<CharacterStatus>,
    ) -> Result<Vec<Character>, StoreError> {
        let filter = match status {
            Some(status) => status_filter(status)?,
            None => Filter::All,
        };
        self.collection(guild_id)?.find(&filter, None).await
    }

    /// Characters, optionally restricted to `status`, each paired with its
    /// player record. `player` is `None` when the record is missing.
    pub async fn get_characters_with_player(
        &self,
        guild_id: &str,
        status: Option<CharacterStatus>,
    ) -> Result<Vec<CharacterWithPlayer>, StoreError> {
        let characters = self.get_all_characters(guild_id, status).await?;
        let player_ids: BTreeSet<&str> = characters.iter().map(|c| c.player.as_str()).collect();
        let players: HashMap<String, Player> = self
            .client
            .guild_db(guild_id)?
            .collection::<Player>()
            .find(&Filter::is_in("id", player_ids), None)
            .await?
            .into_iter()
            .map(|player| (player.player_id.clone(), player))
            .collect();

        Ok(characters
            .into_iter()
            .map(|character| {
                let player = players.get(&character.player).cloned();
                CharacterWithPlayer { character, player }
            })
            .collect())
    }

    /// Overwrite the stored character with `character`.
    pub async fn update_character(
        &self,
        guild_id: &str,
        character: &Character,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.collection(guild_id)?
            .replace_one(character, session)
            .await
            .map(|written| written.is_single())
    }

    async fn modify<F>(
        &self,
        guild_id: &str,
        character_id: &str,
        session: Option<&mut GuildSession>,
        modify: F,
    ) -> Result<bool, StoreError>
    where
        F: FnOnce(Character) -> Character + Send,
    {
        self.collection(guild_id)?
            .modify_one(character_id, session, modify)
            .await
            .map(|written| written.is_single())
    }

    pub async fn add_proficiency(
        &self,
        guild_id: &str,
        character_id: &str,
        proficiency: ProficiencyStub,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.modify(guild_id, character_id, session, move |mut c| {
            c.proficiencies.insert(proficiency);
            c
        })
        .await
    }

    pub async fn remove_proficiency(
        &self,
        guild_id: &str,
        character_id: &str,
        proficiency: ProficiencyStub,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.modify(guild_id, character_id, session, move |mut c| {
            c.proficiencies.remove(&proficiency);
            c
        })
        .await
    }

    pub async fn add_language(
        &self,
        guild_id: &str,
        character_id: &str,
        language: ProficiencyStub,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.modify(guild_id, character_id, session, move |mut c| {
            c.languages.insert(language);
            c
        })
        .await
    }

    pub async fn remove_language(
        &self,
        guild_id: &str,
        character_id: &str,
        language: ProficiencyStub,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.modify(guild_id, character_id, session, move |mut c| {
            c.languages.remove(&language);
            c
        })
        .await
    }

    pub async fn add_money(
        &self,
        guild_id: &str,
        character_id: &str,
        qty: f64,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.modify(guild_id, character_id, session, move |mut c| {
            c.money += qty;
            c
        })
        .await
    }

    pub async fn subtract_money(
        &self,
        guild_id: &str,
        character_id: &str,
        qty: f64,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        self.add_money(guild_id, character_id, -qty, session).await
    }

    /// Add `qty` of `item`. Fails with `InvalidIdentifier` for an empty item
    /// name or one containing `"`.
    pub async fn add_item_to_inventory(
        &self,
        guild_id: &str,
        character_id: &str,
        item: &str,
        qty: i64,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        check_item_name(item)?;
        let item = item.to_string();
        self.modify(guild_id, character_id, session, move |mut c| {
            *c.inventory.entry(item).or_insert(0) += qty;
            c
        })
        .await
    }

    /// Take `qty` of `item`; the entry disappears once nothing is left.
    pub async fn remove_item_from_inventory(
        &self,
        guild_id: &str,
        character_id: &str,
        item: &str,
        qty: i64,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        let item = item.to_string();
        self.modify(guild_id, character_id, session, move |mut c| {
            match c.inventory.get(&item).copied() {
                Some(held) if held <= qty => {
                    c.inventory.remove(&item);
                }
                Some(held) => {
                    c.inventory.insert(item, held - qty);
                }
                None => {}
            }
            c
        })
        .await
    }

    /// Drop `item` from every inventory. Returns how many characters held it.
    /// Item names follow the rules of `add_item_to_inventory`.
    pub async fn remove_item_from_all_inventories(
        &self,
        guild_id: &str,
        item: &str,
        session: Option<&mut GuildSession>,
    ) -> Result<u64, StoreError> {
        self.collection(guild_id)?
            .unset_all(&["inventory", item], session)
            .await
            .map(|written| written.affected)
    }

    pub async fn add_building(
        &self,
        guild_id: &str,
        character_id: &str,
        building: Building,
        base: &BaseBuilding,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        let key = base.key();
        self.modify(guild_id, character_id, session, move |mut c| {
            c.buildings.entry(key).or_default().push(building);
            c
        })
        .await
    }

    pub async fn remove_building(
        &self,
        guild_id: &str,
        character_id: &str,
        building_name: &str,
        base: &BaseBuilding,
        session: Option<&mut GuildSession>,
    ) -> Result<bool, StoreError> {
        let key = base.key();
        let building_name = building_name.to_string();
        self.modify(guild_id, character_id, session, move |mut c| {
            if let Some(buildings) = c.buildings.get_mut(&key) {
                buildings.retain(|b| b.name != building_name);
            }
            c
        })
        .await
    }

    /// Create a character for `player_id`, creating the player first if needed.
    ///
    /// The character id is `"{player_id}:{name}"` and is upserted, so a
    /// retried creation converges on the same document. Starting exp comes
    /// from the guild exp table; a missing table or unknown level aborts the
    /// whole creation, player record included.
    pub async fn create_character(
        &self,
        guild_id: &str,
        player_id: &str,
        player_name: &str,
        data: CharacterCreationData,
    ) -> Result<TransactionOutcome, StoreError> {
        let scope = self.clone();
        let guild = guild_id.to_string();
        let player_id = player_id.to_string();
        let player_name = player_name.to_string();

        self.client
            .transaction(guild_id, move |session| {
                Box::pin(async move {
                    let players = scope.client.players();
                    if players
                        .get_player(&guild, &player_id, Some(&mut *session))
                        .await?
                        .is_none()
                    {
                        players
                            .create_player(&guild, &player_id, &player_name, Some(&mut *session))
                            .await?;
                    }

                    let starting_exp = scope
                        .client
                        .utility()
                        .get_exp_table(&guild, Some(&mut *session))
                        .await?
                        .level_to_exp(&data.starting_level)?;

                    let now = Utc::now();
                    let mut character = Character::new(&player_id, &data.name);
                    character.race = data.race;
                    character.territory = data.territory;
                    character.character_class = data.character_class.into_iter().collect();
                    character.age = data.age;
                    character.created = Some(now);
                    character.errata_ms = starting_exp;
                    character.errata = vec![Errata {
                        ms: starting_exp,
                        description: format!("Starts from level {}", data.starting_level),
                        date: now,
                        status_change: None,
                    }];

                    let written = scope
                        .collection(&guild)?
                        .upsert_one(&character, Some(session))
                        .await?;
                    Ok::<_, StoreError>(written.is_successful())
                })
            })
            .await
    }

    /// Record `errata` on a character: adds its exp, applies its status change
    /// and prepends it to the character's errata list.
    pub async fn add_errata(
        &self,
        guild_id: &str,
        character_id: &str,
        errata: Errata,
    ) -> Result<TransactionOutcome, StoreError> {
        let scope = self.clone();
        let guild = guild_id.to_string();
        let character_id = character_id.to_string();

        self.client
            .transaction(guild_id, move |session| {
                Box::pin(async move {
                    let written = scope
                        .modify(&guild, &character_id, Some(session), move |mut c| {
                            c.errata_ms += errata.ms;
                            if let Some(status) = errata.status_change {
                                c.status = status;
                            }
                            c.errata.insert(0, errata);
                            c
                        })
                        .await?;
                    Ok::<_, StoreError>(written)
                })
            })
            .await
    }
}

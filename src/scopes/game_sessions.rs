use crate::client::GuildClient;
use crate::db::collection::{Collection, Filter};
use crate::error::StoreError;
use crate::models::GameSession;
use crate::utils::{DateRange, days_in_between};
use chrono::NaiveDate;

#[derive(Clone)]
pub struct GameSessionScope {
    client: GuildClient,
}

impl GameSessionScope {
    pub(crate) fn new(client: GuildClient) -> Self {
        Self { client }
    }

    fn collection(&self, guild_id: &str) -> Result<Collection<GameSession>, StoreError> {
        Ok(self.client.guild_db(guild_id)?.collection())
    }

    /// Sessions dated within `range`. An unbounded range returns every dated session.
    pub async fn get_all_sessions(
        &self,
        guild_id: &str,
        range: DateRange,
    ) -> Result<Vec<GameSession>, StoreError> {
        let filter = if range.is_unbounded() {
            Filter::exists("date")
        } else {
            Filter::and(
                range
                    .start
                    .map(|start| Filter::gte("date", start.to_string()))
                    .into_iter()
                    .chain(range.end.map(|end| Filter::lte("date", end.to_string()))),
            )
        };
        self.collection(guild_id)?.find(&filter, None).await
    }

    pub async fn get_all_mastered_sessions(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> Result<Vec<GameSession>, StoreError> {
        self.collection(guild_id)?
            .find(&Filter::eq("master", player_id), None)
            .await
    }

    /// In-game days elapsed between `start` and `end`: the real days of the
    /// interval, both ends included, plus the days played in its sessions.
    pub async fn get_time_passed_in_game(
        &self,
        guild_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError> {
        let played: i64 = self
            .get_all_sessions(guild_id, DateRange::between(start, end))
            .await?
            .iter()
            .map(|session| session.duration)
            .sum();
        Ok(days_in_between(start, end) + 1 + played)
    }
}

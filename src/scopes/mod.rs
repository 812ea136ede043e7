//! Typed operation sets, one per entity family.
//!
//! Single-statement operations run directly on the guild pool unless a
//! session is passed in. Operations made of several reads and writes run
//! inside one `GuildClient::transaction`, threading its session through every
//! statement.

mod bounties;
mod characters;
mod feats;
mod game_sessions;
mod players;
mod utility;

pub use bounties::BountyScope;
pub use characters::CharacterScope;
pub use feats::FeatScope;
pub use game_sessions::GameSessionScope;
pub use players::PlayerScope;
pub use utility::UtilityScope;

use crate::client::GuildClient;
use crate::db::collection::{Document, Filter};
use crate::error::StoreError;
use crate::transaction::TransactionOutcome;

/// Replace the whole content of a collection in one transaction.
async fn rewrite_collection<T: Document>(
    client: &GuildClient,
    guild_id: &str,
    docs: Vec<T>,
) -> Result<TransactionOutcome, StoreError> {
    let collection = client.guild_db(guild_id)?.collection::<T>();
    client
        .transaction(guild_id, move |session| {
            Box::pin(async move {
                collection.delete_many(&Filter::All, Some(&mut *session)).await?;
                for doc in &docs {
                    collection.insert_one(doc, Some(&mut *session)).await?;
                }
                Ok::<_, StoreError>(true)
            })
        })
        .await
}

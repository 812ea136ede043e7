//! Documents stored in guild collections.

pub mod bounty;
pub mod character;
pub mod feat;
pub mod game_session;
pub mod player;
pub mod utility;

pub use bounty::{AnnouncementType, Bounty, Prize};
pub use character::{
    ActiveCharacterOrAllActive, BaseBuilding, Building, Character, CharacterCreationData,
    CharacterStatus, CharacterWithPlayer, Errata, ProficiencyStub,
};
pub use feat::Feat;
pub use game_session::GameSession;
pub use player::Player;
pub use utility::{Announcement, AnnouncementBatch, BuildingMessage, ExpTable, ProficiencyList};

//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the provider and LLM traits,
//! allowing aggregation and HTTP tests without reaching YouTube, Steam or
//! OpenAI.
//!
//! # Example
//!
//! ```rust,ignore
//! use tutorial_finder_core::testing::{fixtures, MockGameProvider, MockVideoProvider};
//!
//! let youtube = MockVideoProvider::unconfigured();
//! let steam = MockGameProvider::new();
//! steam.add_game(fixtures::game("570", "Dota 2")).await;
//! steam.set_guides("570", vec![fixtures::guide("570", 1, "Basics")]).await;
//! ```

mod mock_game_provider;
mod mock_llm_client;
mod mock_video_provider;

pub use mock_game_provider::{MockGameProvider, RecordedGameSearch};
pub use mock_llm_client::MockLlmClient;
pub use mock_video_provider::{MockVideoProvider, RecordedVideoSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::providers::encode_guide_id;
    use crate::tutorial::{ContentType, NormalizedResult};

    /// A YouTube video with reasonable defaults.
    pub fn video(id: &str, title: &str) -> NormalizedResult {
        let mut video = NormalizedResult::new(id, ContentType::Video, title, "YouTube");
        video.creator = Some("Test Channel".to_string());
        video.thumbnail = Some(format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id));
        video.description = Some(format!("A video about {}.", title.to_lowercase()));
        video.published_at = Some("2024-01-01T00:00:00Z".to_string());
        video
    }

    /// A Steam store game.
    pub fn game(app_id: &str, title: &str) -> NormalizedResult {
        let mut game = NormalizedResult::new(app_id, ContentType::Game, title, "Steam");
        game.thumbnail = Some(format!(
            "https://cdn.akamai.steamstatic.com/steam/apps/{}/capsule_sm_120.jpg",
            app_id
        ));
        game.price = Some(59.99);
        game.currency = Some("USD".to_string());
        game
    }

    /// The `sequence`-th community guide of a game, as the Steam client returns it.
    pub fn guide(app_id: &str, sequence: usize, title: &str) -> NormalizedResult {
        let mut guide = NormalizedResult::new(
            encode_guide_id(app_id, sequence),
            ContentType::Guide,
            title,
            "Steam Community",
        );
        guide.creator = Some("76561198000000000".to_string());
        guide.description = Some(format!("{} for app {}.", title, app_id));
        guide.views = Some(1000);
        guide.rating = Some(4.5);
        guide.rating_count = Some(20);
        guide.game_id = Some(app_id.to_string());
        guide
    }
}

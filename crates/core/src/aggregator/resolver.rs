//! Single-result lookups by `(id, source)`.

use tracing::debug;

use super::TutorialAggregator;
use crate::providers::{decode_guide_id, is_guide_id};
use crate::tutorial::{NormalizedResult, SourceKind, TutorialError};

impl TutorialAggregator {
    /// Fetch one result from the source that owns it.
    ///
    /// Steam ids starting with `guide_` are guides: the owning game is
    /// recovered from the id, its guides are refetched and the one with the
    /// same id is returned. Provider errors pass through unchanged.
    pub async fn get_tutorial_details(
        &self,
        id: &str,
        source: &str,
    ) -> Result<NormalizedResult, TutorialError> {
        let kind: SourceKind = source.parse()?;

        debug!(id = %id, source = %kind, "Resolving tutorial details");

        match kind {
            SourceKind::Youtube => self.youtube.get_video_details(id).await,
            SourceKind::Steam if is_guide_id(id) => self.resolve_guide(id).await,
            SourceKind::Steam => self.steam.get_game_details(id).await,
        }
    }

    async fn resolve_guide(&self, id: &str) -> Result<NormalizedResult, TutorialError> {
        let (app_id, _) = decode_guide_id(id)?;

        self.steam
            .get_game_guides(&app_id)
            .await?
            .into_iter()
            .find(|guide| guide.id == id)
            .map(|mut guide| {
                guide.game_id.get_or_insert_with(|| app_id.clone());
                guide
            })
            .ok_or_else(|| TutorialError::NotFound(format!("Guide {} not found", id)))
    }
}

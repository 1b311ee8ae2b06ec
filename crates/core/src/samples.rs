//! Static tutorials served when live providers are unavailable.

use crate::tutorial::{ContentType, NormalizedResult};

/// The fixed sample dataset.
pub fn sample_tutorials() -> Vec<NormalizedResult> {
    let mut video = NormalizedResult::new(
        "1",
        ContentType::Video,
        "How to Beat Malenia - Complete Strategy Guide",
        "YouTube",
    );
    video.creator = Some("GameGuideGuru".to_string());
    video.duration = Some("15:24".to_string());
    video.views = Some(1_200_000);
    video.rating = Some(4.8);
    video.rating_count = Some(2345);
    video.thumbnail =
        Some("https://placehold.co/400x200/3366CC/FFFFFF?text=Malenia+Guide".to_string());
    video.description = Some(
        "This comprehensive guide covers all phases of the Malenia boss fight with strategies \
         for different builds and playstyles."
            .to_string(),
    );

    let mut text = NormalizedResult::new(
        "2",
        ContentType::Text,
        "Malenia Boss Fight - Tips and Tricks for All Builds",
        "GameFAQs",
    );
    text.creator = Some("GameFAQs".to_string());
    text.updated = Some("3 days ago".to_string());
    text.rating = Some(5.0);
    text.rating_count = Some(876);
    text.description = Some(
        "A detailed walkthrough with specific tips for defeating Malenia with different \
         character builds and weapon combinations."
            .to_string(),
    );

    vec![video, text]
}

/// Look up one sample by id.
pub fn sample_tutorial(id: &str) -> Option<NormalizedResult> {
    sample_tutorials().into_iter().find(|t| t.id == id)
}

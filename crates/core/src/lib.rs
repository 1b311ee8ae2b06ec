pub mod aggregator;
pub mod auth;
pub mod cache;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod providers;
pub mod samples;
pub mod testing;
pub mod tutorial;

pub use aggregator::{AggregatorSettings, TutorialAggregator, MAX_QUERY_LEN};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Claims, Identity,
    JwtAuthenticator, NoneAuthenticator,
};
pub use cache::ResponseCache;
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, CacheConfig,
    Config, ConfigError, ProvidersConfig, SanitizedConfig, ServerConfig,
};
pub use generator::{
    GeneratedTutorial, GenerationOptions, GeneratorConfig, GeneratorError, LlmClient, LlmError,
    OpenAiClient, TutorialGenerator,
};
pub use providers::{
    GameProvider, SteamClient, SteamConfig, VideoProvider, VideoSearchOptions, YouTubeClient,
    YouTubeConfig,
};
pub use samples::{sample_tutorial, sample_tutorials};
pub use tutorial::{
    AggregatedResponse, ContentType, NormalizedResult, SearchOptions, SourceError, SourceKind,
    TutorialError, VideoLength,
};

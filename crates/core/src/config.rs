use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub postgres: PostgresConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DUGOUT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DUGOUT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            catalog: CatalogConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            engine: EngineConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  catalog:   data_dir={}, seed={}",
            self.catalog.data_dir.display(),
            self.catalog
                .seed_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(bundled)".to_string())
        );
        tracing::info!(
            "  store:     backend={}, fixture={}",
            self.store.backend,
            self.store.fixture_path.display()
        );
        tracing::info!("  postgres:  host={}, db={}", self.postgres.host, self.postgres.database);
        tracing::info!(
            "  llm:       provider={}, fallback={}",
            self.llm.provider,
            self.llm.fallback_enabled
        );
        tracing::info!("  ollama:    url={}", self.ollama.url);
        tracing::info!(
            "  engine:    default_limit={}, max_limit={}, fuzzy_threshold={}",
            self.engine.default_limit,
            self.engine.max_limit,
            self.engine.fuzzy_threshold
        );
    }

    /// Return a redacted view (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "catalog": { "data_dir": self.catalog.data_dir, "seed_path": self.catalog.seed_path },
            "store": { "backend": self.store.backend, "fixture_path": self.store.fixture_path },
            "postgres": {
                "host": self.postgres.host,
                "port": self.postgres.port,
                "database": self.postgres.database,
                "configured": self.postgres.is_configured(),
            },
            "llm": {
                "provider": self.llm.provider,
                "fallback_enabled": self.llm.fallback_enabled,
                "configured": self.llm.is_configured(),
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
            "engine": {
                "default_limit": self.engine.default_limit,
                "max_limit": self.engine.max_limit,
                "fuzzy_threshold": self.engine.fuzzy_threshold,
                "store_timeout_ms": self.engine.store_timeout_ms,
                "classifier_timeout_ms": self.engine.classifier_timeout_ms,
            },
        })
    }
}

// ── Catalog ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Persisted snapshots live under `{data_dir}/catalog`.
    pub data_dir: PathBuf,
    /// Seed YAML override. `None` uses the bundled seed.
    pub seed_path: Option<PathBuf>,
}

impl CatalogConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            seed_path: profiled_env_opt(p, "CATALOG_SEED_PATH").map(PathBuf::from),
        }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("catalog")
    }
}

// ── Stats store ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" or "postgres"
    pub backend: String,
    /// JSON fixture read by the memory backend.
    pub fixture_path: PathBuf,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "STORE_BACKEND", "memory"),
            fixture_path: PathBuf::from(profiled_env_or(
                p,
                "STORE_FIXTURE_PATH",
                "data/fixtures/kbo-sample.json",
            )),
        }
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_parse(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "kbo"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.username.is_some()
    }
}

// ── LLM (OpenAI / Anthropic) ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Whether unmatched utterances with entities go to the generative classifier.
    pub fallback_enabled: bool,
    pub prompt_path: PathBuf,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "ollama"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-3-5-haiku-latest"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.0),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 64),
            fallback_enabled: profiled_env_bool(p, "LLM_FALLBACK_ENABLED", false),
            prompt_path: PathBuf::from(profiled_env_or(
                p,
                "LLM_PROMPT_PATH",
                "data/prompts/intent-classifier-system.md",
            )),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    /// Minimum jamo similarity for a fuzzy entity match.
    pub fuzzy_threshold: f64,
    pub store_timeout_ms: u64,
    pub classifier_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 30,
            fuzzy_threshold: 0.75,
            store_timeout_ms: 3_000,
            classifier_timeout_ms: 5_000,
        }
    }
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        let max_limit = profiled_env_parse(p, "ENGINE_MAX_LIMIT", d.max_limit).max(1);
        Self {
            default_limit: profiled_env_parse(p, "ENGINE_DEFAULT_LIMIT", d.default_limit)
                .clamp(1, max_limit),
            max_limit,
            fuzzy_threshold: profiled_env_parse(p, "ENGINE_FUZZY_THRESHOLD", d.fuzzy_threshold)
                .clamp(0.0, 1.0),
            store_timeout_ms: profiled_env_parse(p, "ENGINE_STORE_TIMEOUT_MS", d.store_timeout_ms),
            classifier_timeout_ms: profiled_env_parse(
                p,
                "ENGINE_CLASSIFIER_TIMEOUT_MS",
                d.classifier_timeout_ms,
            ),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiled_key_wins_over_plain_key() {
        env::set_var("DUGOUT_TEST_PROFILE_PG_DATABASE", "kbo_prod");
        let cfg = PostgresConfig::from_env_profiled("DUGOUT_TEST_PROFILE");
        assert_eq!(cfg.database, "kbo_prod");
        env::remove_var("DUGOUT_TEST_PROFILE_PG_DATABASE");
    }

    #[test]
    fn engine_defaults_match_documented_limits() {
        let d = EngineConfig::default();
        assert_eq!(d.default_limit, 5);
        assert_eq!(d.max_limit, 30);
        assert!((d.fuzzy_threshold - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn connection_string_defaults_user() {
        let cfg = PostgresConfig {
            host: "db".into(),
            port: 5432,
            database: "kbo".into(),
            username: None,
            password: None,
            ssl_mode: "disable".into(),
            max_connections: 1,
        };
        assert_eq!(cfg.connection_string(), "postgres://postgres:@db:5432/kbo?sslmode=disable");
    }

    #[test]
    fn redacted_summary_omits_keys() {
        let mut cfg = Config::for_profile("DUGOUT_REDACT_TEST");
        cfg.llm.openai_api_key = Some("sk-secret".into());
        let text = cfg.redacted_summary().to_string();
        assert!(!text.contains("sk-secret"));
    }
}

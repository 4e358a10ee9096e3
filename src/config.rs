use anyhow::{Context, Result, ensure};
use clap::Parser;
use std::env;

/// Longest accepted session lifetime (ten years).
pub const MAX_SESSION_TIMEOUT_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub upload_dir: String,
    pub session_timeout_secs: u64,
    pub site: SiteConfig,
}

/// Site-wide strings copied into `config_pairs` by the seed routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: String,
    pub footer: String,
}

/// What the binary should do after parsing its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Migrate,
    Seed,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "soyboard administration backend")]
pub struct Args {
    /// Host to bind to (overrides SOYBOARD_ADMIN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SOYBOARD_ADMIN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides SOYBOARD_ADMIN_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory where uploaded images are stored (overrides SOYBOARD_ADMIN_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Admin session lifetime in seconds (overrides SOYBOARD_ADMIN_SESSION_TIMEOUT)
    #[arg(long)]
    pub session_timeout_secs: Option<u64>,

    /// Create the schema and exit
    #[arg(long, conflicts_with = "seed")]
    pub migrate: bool,

    /// Drop everything, recreate the schema, insert sample rows and exit
    #[arg(long)]
    pub seed: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and run mode.
    pub fn from_env_and_args() -> Result<(Self, Mode)> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("SOYBOARD_ADMIN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("SOYBOARD_ADMIN_PORT", 5000u16)?;
        let env_db = env::var("SOYBOARD_ADMIN_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/soyboard.db".into());
        let env_uploads =
            env::var("SOYBOARD_ADMIN_UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".into());
        let env_timeout = parse_env("SOYBOARD_ADMIN_SESSION_TIMEOUT", 86_400u64)?;

        let site = SiteConfig {
            title: env::var("SOYBOARD_SITE_TITLE").unwrap_or_else(|_| "soyboard".into()),
            tagline: env::var("SOYBOARD_SITE_TAGLINE")
                .unwrap_or_else(|_| "the imageboard for soy enthusiasts".into()),
            footer: env::var("SOYBOARD_SITE_FOOTER")
                .unwrap_or_else(|_| "powered by soyboard".into()),
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            upload_dir: args.upload_dir.unwrap_or(env_uploads),
            session_timeout_secs: args.session_timeout_secs.unwrap_or(env_timeout),
            site,
        };

        cfg.check()?;

        let mode = if args.seed {
            Mode::Seed
        } else if args.migrate {
            Mode::Migrate
        } else {
            Mode::Serve
        };

        Ok((cfg, mode))
    }

    /// Reject settings that would only fail later, at request time.
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.session_timeout_secs <= MAX_SESSION_TIMEOUT_SECS,
            "session timeout {}s exceeds the maximum of {}s",
            self.session_timeout_secs,
            MAX_SESSION_TIMEOUT_SECS
        );
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SiteConfig {
    /// Key/value pairs inserted into `config_pairs` when seeding.
    pub fn site_defaults(&self) -> [(&'static str, &str); 3] {
        [
            ("site_tagline", self.tagline.as_str()),
            ("site_title", self.title.as_str()),
            ("site_footer", self.footer.as_str()),
        ]
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_defaults_cover_the_three_seeded_keys() {
        let site = SiteConfig {
            title: "t".into(),
            tagline: "g".into(),
            footer: "f".into(),
        };
        let pairs = site.site_defaults();
        assert_eq!(
            pairs,
            [("site_tagline", "g"), ("site_title", "t"), ("site_footer", "f")]
        );
    }

    #[test]
    fn oversized_session_timeout_is_rejected() {
        let mut cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            database_url: "sqlite::memory:".into(),
            upload_dir: "./uploads".into(),
            session_timeout_secs: MAX_SESSION_TIMEOUT_SECS,
            site: SiteConfig {
                title: "t".into(),
                tagline: "g".into(),
                footer: "f".into(),
            },
        };
        assert!(cfg.check().is_ok());

        cfg.session_timeout_secs = 10_000_000_000_000;
        let err = cfg.check().unwrap_err();
        assert!(err.to_string().contains("session timeout"));
    }

    #[test]
    fn args_parse_mode_flags() {
        let args = Args::try_parse_from(["soyboard-admin", "--seed", "--port", "8080"]).unwrap();
        assert!(args.seed);
        assert!(!args.migrate);
        assert_eq!(args.port, Some(8080));

        assert!(Args::try_parse_from(["soyboard-admin", "--seed", "--migrate"]).is_err());
    }
}

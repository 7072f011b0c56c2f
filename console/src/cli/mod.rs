use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evadmin_client::{AccessClaims, FileSessionStore, Gateway, NavigationPort, SessionStore};
use evadmin_utils::{logger, signal};
use tracing::level_filters::LevelFilter;

use self::resources::{
    InvoicesCmd, LocationsCmd, PlansCmd, ReservationsCmd, SessionsCmd, StationsCmd, VehiclesCmd,
};
use crate::browse::{self, BrowseResource};
use crate::config::{AppConfig, LoginSecrets};

mod list;
mod resources;

pub use self::list::canonical_status;

#[derive(Parser)]
#[clap(name = "evadmin")]
#[clap(version = version_string())]
#[clap(subcommand_required = true, arg_required_else_help = true)]
pub struct App {
    /// Path to the config file.
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables.
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    cmd: Cmd,
}

impl App {
    pub fn run(self) -> Result<()> {
        let config: AppConfig = match self.config.as_ref() {
            Some(path) => evadmin_utils::serde::load_json_from_file(path)
                .context("failed to load config")?,
            None => AppConfig::default(),
        };

        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(signal::run_or_terminate(self.run_impl(config)))
    }

    async fn run_impl(self, config: AppConfig) -> Result<()> {
        logger::init_logger(&config.logger, LevelFilter::WARN)?;
        logger::set_abort_with_tracing();

        let console = Console::connect(config, self.json)?;
        let res = self.cmd.run(&console).await;

        if console.navigation.was_redirected() {
            eprintln!("Session expired. Run `evadmin login` to sign in again.");
        }
        res
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Sign in. The password is read from `EVADMIN_PASSWORD`.
    Login {
        #[clap(short, long)]
        email: String,
    },

    /// Sign out and forget the stored tokens.
    Logout,

    /// Show who the stored session belongs to.
    Whoami,

    /// Page through a resource interactively.
    Browse {
        resource: BrowseResource,
    },

    #[clap(subcommand)]
    Stations(StationsCmd),

    #[clap(subcommand)]
    Plans(PlansCmd),

    #[clap(subcommand)]
    Vehicles(VehiclesCmd),

    #[clap(subcommand)]
    Reservations(ReservationsCmd),

    #[clap(subcommand)]
    Invoices(InvoicesCmd),

    #[clap(subcommand)]
    Sessions(SessionsCmd),

    #[clap(subcommand)]
    Locations(LocationsCmd),
}

impl Cmd {
    async fn run(self, console: &Console) -> Result<()> {
        match self {
            Cmd::Login { email } => {
                let secrets = LoginSecrets::from_env()?;
                console
                    .gateway
                    .auth()
                    .login(&secrets.credentials(&email))
                    .await
                    .context("login failed")?;
                console.done(format_args!("logged in as {email}"));
                Ok(())
            }
            Cmd::Logout => {
                if !console.gateway.session().has_session() {
                    console.done("not logged in");
                    return Ok(());
                }
                let acknowledged = console.gateway.auth().logout().await?;
                if !acknowledged {
                    tracing::warn!("backend did not confirm the logout");
                }
                console.done("logged out");
                Ok(())
            }
            Cmd::Whoami => console.whoami(),
            Cmd::Browse { resource } => browse::run(console, resource).await,
            Cmd::Stations(cmd) => cmd.run(console).await,
            Cmd::Plans(cmd) => cmd.run(console).await,
            Cmd::Vehicles(cmd) => cmd.run(console).await,
            Cmd::Reservations(cmd) => cmd.run(console).await,
            Cmd::Invoices(cmd) => cmd.run(console).await,
            Cmd::Sessions(cmd) => cmd.run(console).await,
            Cmd::Locations(cmd) => cmd.run(console).await,
        }
    }
}

/// Everything a command needs: config, a connected gateway and output mode.
pub struct Console {
    config: AppConfig,
    gateway: Gateway,
    navigation: Arc<LoginPrompt>,
    json: bool,
}

impl Console {
    fn connect(config: AppConfig, json: bool) -> Result<Self> {
        let session: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::open(&config.session.path));
        let navigation = Arc::new(LoginPrompt::default());

        let http_client = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .user_agent(concat!("evadmin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        let gateway = Gateway::builder()
            .with_session_store(session)
            .with_navigation(navigation.clone())
            .with_base_url(&config.api.base_url)
            .with_http_client(http_client)
            .build()
            .with_context(|| format!("invalid api base url '{}'", config.api.base_url))?;

        tracing::debug!(
            base_url = gateway.base_url(),
            session = %config.session.path.display(),
            "console connected"
        );

        Ok(Self {
            config,
            gateway,
            navigation,
            json,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn page_size(&self) -> u32 {
        self.config.list.page_size
    }

    pub fn session_expired(&self) -> bool {
        self.navigation.was_redirected()
    }

    /// Confirmation line for commands without a result to print.
    pub fn done(&self, message: impl Display) {
        if self.json {
            println!("{}", serde_json::json!({ "message": message.to_string() }));
        } else {
            println!("{message}");
        }
    }

    fn whoami(&self) -> Result<()> {
        let Some(access_token) = self.gateway.session().access_token() else {
            self.done("not logged in");
            return Ok(());
        };

        let claims = AccessClaims::peek(&access_token).context("stored token is unreadable")?;
        let expires = claims
            .exp
            .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            return Ok(());
        }

        println!("subject: {}", claims.sub.as_deref().unwrap_or("-"));
        println!("email:   {}", claims.email.as_deref().unwrap_or("-"));
        match expires {
            Some(at) if at <= chrono::Utc::now() => {
                println!("expires: {at} (expired, refreshed on next call)")
            }
            Some(at) => println!("expires: {at}"),
            None => println!("expires: -"),
        }
        Ok(())
    }
}

/// Navigation for a terminal: there is no login screen to show, so the
/// redirect is remembered and reported once the command finishes.
#[derive(Default)]
struct LoginPrompt {
    redirected: AtomicBool,
}

impl LoginPrompt {
    fn was_redirected(&self) -> bool {
        self.redirected.load(Ordering::Acquire)
    }
}

impl NavigationPort for LoginPrompt {
    fn redirect_to_login(&self) {
        tracing::warn!("session ended, login required");
        self.redirected.store(true, Ordering::Release);
    }
}

fn version_string() -> &'static str {
    static STRING: OnceLock<String> = OnceLock::new();
    STRING.get_or_init(|| format!("(release {EVADMIN_VERSION}) (rustc {RUSTC_VERSION})"))
}

static EVADMIN_VERSION: &str = env!("EVADMIN_VERSION");
static RUSTC_VERSION: &str = env!("EVADMIN_RUSTC_VERSION");

use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};

use crate::api::{ApiError, ApiService, DEFAULT_BASE_URL, HEALTH_TIMEOUT};
use crate::cli::args::{CliArgs, Command, ListArgs, OutputArgs, PatchArgs};
use crate::cli::validation;
use crate::client::{HttpTransport, RequestClient, RetryPolicy};
use crate::config::{self, ConfigFile};
use crate::listing::{FilterCriteria, ListController, DEFAULT_PAGE_SIZE};
use crate::models::{DonationRequest, LoginRequest, RegisterRequest, VolunteerApplication};
use crate::render::{self, OutputFormat};
use crate::session::{FileStorage, MemoryStorage, SessionStore, Storage};

const FEATURED_COUNT: usize = 3;
const HOME_DONATIONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    Success,
    Error,
    Warning,
    Info,
}

pub fn notice_line(kind: Notice, message: &str) -> String {
    let tag = match kind {
        Notice::Success => "OK".bold().green(),
        Notice::Error => "ERR".bold().red(),
        Notice::Warning => "WRN".bold().yellow(),
        Notice::Info => "INF".bold().blue(),
    };
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message.bold().white()
    )
}

pub fn notify(kind: Notice, message: &str) {
    eprintln!("{}", notice_line(kind, message));
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub base_url: String,
    pub retry: RetryPolicy,
    pub health_timeout: Duration,
    pub page_size: usize,
    pub storage_path: Option<PathBuf>,
    pub proxy: Option<String>,
    pub no_color: bool,
    pub log_level: Option<String>,
}

/// Merges CLI flags over the (already env-merged) config file.
pub fn build_settings(args: &CliArgs, cfg: ConfigFile) -> Result<Settings, String> {
    validation::validate(args)?;

    let base_url = args
        .base_url
        .clone()
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim()
        .to_string();

    let mut retry = RetryPolicy::default();
    if let Some(timeout) = args.timeout.or(cfg.timeout) {
        if timeout == 0 {
            return Err("invalid timeout, expected positive number of seconds".to_string());
        }
        retry.timeout = Duration::from_secs(timeout);
    }
    if let Some(retries) = args.retries.or(cfg.retries) {
        retry.retries = retries;
    }
    if let Some(backoff_ms) = cfg.backoff_ms {
        retry.backoff = Duration::from_millis(backoff_ms);
    }
    if let Some(raw) = cfg.retry_statuses.as_deref() {
        retry.retry_statuses = crate::utils::parse_u16_set_csv(raw)
            .map_err(|e| format!("invalid retry_statuses '{raw}': {e}"))?;
    }

    let health_timeout = cfg
        .health_timeout
        .filter(|t| *t > 0)
        .map(Duration::from_secs)
        .unwrap_or(HEALTH_TIMEOUT);

    let page_size = cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }

    let storage_path = args
        .storage
        .clone()
        .or(cfg.storage)
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_storage_path);

    Ok(Settings {
        base_url,
        retry,
        health_timeout,
        page_size,
        storage_path,
        proxy: args.proxy.clone().or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        log_level: cfg.log_level,
    })
}

fn resolve_format(output: &OutputArgs) -> OutputFormat {
    output
        .format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| output.output.as_deref().and_then(render::infer_format_from_path))
        .unwrap_or(OutputFormat::Text)
}

fn api_err(e: ApiError) -> String {
    debug!(error = ?e, "request failed");
    e.user_message()
}

/// Owns the API service (client and session) and the list controller of
/// the current invocation.
pub struct App {
    api: ApiService,
    settings: Settings,
    listing: Option<ListController>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, String> {
        let transport = HttpTransport::new(settings.proxy.as_deref(), settings.retry.timeout)
            .map_err(|e| e.to_string())?;
        let client = RequestClient::new(Arc::new(transport), settings.retry.clone());
        let storage: Box<dyn Storage> = match settings.storage_path.as_ref() {
            Some(path) => Box::new(FileStorage::new(path)),
            None => {
                notify(
                    Notice::Warning,
                    "no home directory found, the session will not be persisted",
                );
                Box::new(MemoryStorage::default())
            }
        };
        Self::with_client(settings, client, SessionStore::new(storage))
    }

    pub fn with_client(
        settings: Settings,
        client: RequestClient,
        session: SessionStore,
    ) -> Result<Self, String> {
        let api = ApiService::new(client, &settings.base_url, session)
            .map_err(|e| e.to_string())?
            .with_health_timeout(settings.health_timeout);
        Ok(Self {
            api,
            settings,
            listing: None,
        })
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    pub fn listing(&self) -> Option<&ListController> {
        self.listing.as_ref()
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !std::io::stderr().is_terminal() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        Some(pb)
    }

    async fn busy<T>(&self, message: &str, fut: impl Future<Output = T>) -> T {
        let pb = self.spinner(message);
        let out = fut.await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        out
    }

    async fn emit(&self, bytes: Vec<u8>, output: &OutputArgs) -> Result<(), String> {
        match output.output.as_deref() {
            Some(path) => {
                let path = config::expand_tilde(path);
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| format!("failed to write output '{}': {e}", path.display()))?;
                notify(
                    Notice::Success,
                    &format!("wrote {} bytes to {}", bytes.len(), path.display()),
                );
            }
            None => print!("{}", String::from_utf8_lossy(&bytes)),
        }
        Ok(())
    }

    pub async fn run(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::List(args) => self.list(args).await,
            Command::Show { id, output } => self.show(&id, &output).await,
            Command::Search { term, page, output } => self.search(&term, page, &output).await,
            Command::Home => self.home().await,
            Command::Login { email, password } => self.login(email, password).await,
            Command::Register {
                name,
                email,
                password,
                phone,
            } => self.register(name, email, password, phone).await,
            Command::Logout => self.logout().await,
            Command::Whoami { remote } => self.whoami(remote).await,
            Command::Donate {
                amount,
                email,
                name,
                method,
            } => self.donate(amount, email, name, method).await,
            Command::Donations { limit, output } => self.donations(limit, &output).await,
            Command::Volunteer {
                name,
                email,
                phone,
                role,
                experience,
                availability,
            } => {
                self.volunteer(name, email, phone, role, experience, availability)
                    .await
            }
            Command::Update { id, patch } => self.update(&id, &patch).await,
            Command::Health => self.health().await,
            Command::Init => Ok(()),
        }
    }

    /// Loads the record set into a fresh list controller and moves to `page`.
    fn load_listing(
        &mut self,
        records: Vec<crate::models::Animal>,
        page_size: usize,
        criteria: FilterCriteria,
        page: Option<usize>,
    ) -> Result<&ListController, String> {
        let mut list = ListController::new(records, page_size).map_err(|e| e.to_string())?;
        list.apply(criteria);
        if let Some(page) = page {
            list.set_page(page).map_err(|e| e.to_string())?;
        }
        Ok(self.listing.insert(list))
    }

    async fn list(&mut self, args: ListArgs) -> Result<(), String> {
        // Without a session all_animals fails locally with a login prompt.
        let all = match (args.all, self.api.session().load()) {
            (true, Some(session)) if !session.is_admin() => {
                notify(
                    Notice::Warning,
                    "Only admins can list every animal; showing available animals.",
                );
                false
            }
            (all, _) => all,
        };
        let fetched = if all {
            self.busy("loading all animals", self.api.all_animals()).await
        } else {
            self.busy("loading animals", self.api.available_animals())
                .await
        };
        let records = fetched.map_err(api_err)?;

        let page_size = args.page_size.unwrap_or(self.settings.page_size);
        let list = self.load_listing(records, page_size, args.filters.to_criteria(), args.page)?;
        let bytes = render::render_listing(&list.view(), &list.stats(), resolve_format(&args.output));
        self.emit(bytes, &args.output).await
    }

    async fn search(&mut self, term: &str, page: Option<usize>, output: &OutputArgs) -> Result<(), String> {
        let records = self
            .busy("searching", self.api.search_animals(term))
            .await
            .map_err(api_err)?;
        let page_size = self.settings.page_size;
        let list = self.load_listing(records, page_size, FilterCriteria::default(), page)?;
        let bytes = render::render_listing(&list.view(), &list.stats(), resolve_format(output));
        self.emit(bytes, output).await
    }

    async fn show(&self, id: &str, output: &OutputArgs) -> Result<(), String> {
        let animal = self
            .busy("loading animal", self.api.animal(id.trim()))
            .await
            .map_err(api_err)?;
        self.emit(render::render_animal(&animal, resolve_format(output)), output)
            .await
    }

    async fn home(&mut self) -> Result<(), String> {
        let (animals, donations) = self
            .busy("loading", async {
                futures::join!(
                    self.api.available_animals(),
                    self.api.recent_donations(HOME_DONATIONS)
                )
            })
            .await;

        let mut failures = 0;
        match animals {
            Ok(animals) => {
                let featured: Vec<_> = animals
                    .into_iter()
                    .filter(|a| a.status().is_available())
                    .take(FEATURED_COUNT)
                    .collect();
                println!("{}", "Featured animals".bold());
                let list =
                    self.load_listing(featured, FEATURED_COUNT, FilterCriteria::default(), None)?;
                print!(
                    "{}",
                    String::from_utf8_lossy(&render::render_listing(
                        &list.view(),
                        &list.stats(),
                        OutputFormat::Text
                    ))
                );
            }
            Err(e) => {
                failures += 1;
                notify(
                    Notice::Error,
                    &format!("could not load animals: {}", api_err(e)),
                );
            }
        }

        match donations {
            Ok(messages) => {
                println!("\n{}", "Recent donations".bold());
                print!(
                    "{}",
                    String::from_utf8_lossy(&render::render_donations(
                        &messages,
                        OutputFormat::Text
                    ))
                );
            }
            Err(e) => {
                failures += 1;
                notify(
                    Notice::Error,
                    &format!("could not load donations: {}", api_err(e)),
                );
            }
        }

        if !self.api.check_health().await {
            notify(
                Notice::Warning,
                "The backend is not responding. Some features may be unavailable.",
            );
        }
        if failures == 2 {
            return Err("could not load the home page".to_string());
        }
        Ok(())
    }

    async fn login(&self, email: String, password: String) -> Result<(), String> {
        let session = self
            .busy(
                "logging in",
                self.api.login(&LoginRequest {
                    email: email.trim().to_string(),
                    password,
                }),
            )
            .await
            .map_err(api_err)?;
        let name = session
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or(email);
        notify(Notice::Success, &format!("Welcome back, {name}!"));
        Ok(())
    }

    async fn register(
        &self,
        name: String,
        email: String,
        password: String,
        phone: String,
    ) -> Result<(), String> {
        let form = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password,
            phone: phone.trim().to_string(),
        };
        self.busy("creating account", self.api.register(&form))
            .await
            .map_err(api_err)?;
        info!(email = %form.email, "registration accepted, logging in");

        let credentials = LoginRequest {
            email: form.email.clone(),
            password: form.password.clone(),
        };
        match self.busy("logging in", self.api.login(&credentials)).await {
            Ok(_) => notify(
                Notice::Success,
                &format!("Welcome to the family, {}!", form.name),
            ),
            Err(e) => notify(
                Notice::Warning,
                &format!(
                    "Registration successful, but automatic login failed ({}). Please login.",
                    api_err(e)
                ),
            ),
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), String> {
        let was_logged_in = self.api.session().is_authenticated();
        self.api.logout().await.map_err(api_err)?;
        if was_logged_in {
            notify(Notice::Success, "You have been logged out.");
        } else {
            notify(Notice::Info, "No active session.");
        }
        Ok(())
    }

    async fn whoami(&self, remote: bool) -> Result<(), String> {
        let user = if remote {
            Some(
                self.busy("loading profile", self.api.current_user())
                    .await
                    .map_err(api_err)?,
            )
        } else {
            if !self.api.session().is_authenticated() {
                return Err("Not logged in.".to_string());
            }
            self.api.session().current_user()
        };
        match user {
            Some(user) => {
                println!(":: {:<10}: {}", "Name", user.display_name());
                println!(":: {:<10}: {}", "Email", user.email);
                println!(":: {:<10}: {}", "Role", user.role);
                if user.is_volunteer {
                    println!(":: {:<10}: {}", "Volunteer", "yes");
                }
            }
            None => println!("Logged in (no stored profile)."),
        }
        Ok(())
    }

    async fn donate(
        &self,
        amount: f64,
        email: Option<String>,
        name: Option<String>,
        method: String,
    ) -> Result<(), String> {
        let user = self.api.session().current_user();
        let request = DonationRequest {
            amount,
            donor_email: email.or_else(|| user.as_ref().map(|u| u.email.clone())),
            payment_method: method,
            donor_name: name.or_else(|| user.as_ref().map(|u| u.display_name().to_string())),
            user_id: user.as_ref().and_then(|u| u.id.clone()),
        };
        let ack = self
            .busy("processing donation", self.api.process_donation(&request))
            .await
            .map_err(api_err)?;
        let message = ack.message.unwrap_or_else(|| {
            format!(
                "Thank you for your donation of {}!",
                render::format_amount(amount)
            )
        });
        notify(Notice::Success, &message);
        Ok(())
    }

    async fn donations(&self, limit: usize, output: &OutputArgs) -> Result<(), String> {
        let messages = self
            .busy("loading donations", self.api.recent_donations(limit))
            .await
            .map_err(api_err)?;
        self.emit(render::render_donations(&messages, resolve_format(output)), output)
            .await
    }

    async fn volunteer(
        &self,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        role: String,
        experience: String,
        availability: String,
    ) -> Result<(), String> {
        let user = self.api.session().current_user();
        let full_name = name
            .or_else(|| user.as_ref().map(|u| u.display_name().to_string()))
            .filter(|n| !n.trim().is_empty())
            .ok_or("--name is required when not logged in")?;
        let email = email
            .or_else(|| user.as_ref().map(|u| u.email.clone()))
            .filter(|e| !e.trim().is_empty())
            .ok_or("--email is required when not logged in")?;
        let phone = phone
            .or_else(|| user.as_ref().and_then(|u| u.phone.clone()))
            .unwrap_or_default();

        let application = VolunteerApplication {
            full_name,
            email,
            phone,
            role,
            experience,
            availability,
            user_id: user.as_ref().and_then(|u| u.id.clone()),
            application_date: Utc::now().to_rfc3339(),
        };
        let ack = self
            .busy(
                "submitting application",
                self.api.submit_volunteer_application(&application),
            )
            .await
            .map_err(api_err)?;
        notify(
            Notice::Success,
            ack.message
                .as_deref()
                .unwrap_or("Thank you for applying! We will contact you soon."),
        );
        Ok(())
    }

    async fn update(&self, id: &str, patch: &PatchArgs) -> Result<(), String> {
        let patch = patch.to_patch()?;
        let mut animal = self
            .busy("loading animal", self.api.animal(id.trim()))
            .await
            .map_err(api_err)?;
        patch.apply(&mut animal);
        let updated = self
            .busy("saving", self.api.update_animal(id.trim(), &animal))
            .await
            .map_err(api_err)?;
        notify(
            Notice::Success,
            &format!("Updated {} (#{}).", updated.name, updated.id),
        );
        print!(
            "{}",
            String::from_utf8_lossy(&render::render_animal(&updated, OutputFormat::Text))
        );
        Ok(())
    }

    async fn health(&self) -> Result<(), String> {
        let url = self.api.base_url().to_string();
        if self.busy("checking backend", self.api.check_health()).await {
            notify(Notice::Success, &format!("backend at {url} is healthy"));
            Ok(())
        } else {
            Err(format!("backend at {url} is not responding"))
        }
    }
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory, pass --config".to_string())?,
    };
    if path.exists() {
        notify(
            Notice::Info,
            &format!("config already exists at {}", path.display()),
        );
        return Ok(());
    }
    config::ensure_default_config_file(&path).map_err(|e| e.to_string())?;
    notify(
        Notice::Success,
        &format!("wrote default config to {}", path.display()),
    );
    Ok(())
}

fn load_file_config(args: &CliArgs) -> Result<ConfigFile, String> {
    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
    .map_err(|e| e.to_string())?;
    config::apply_env_overrides(cfg, config::env_lookup).map_err(|e| e.to_string())
}

async fn run_async(settings: Settings, command: Command) -> Result<(), String> {
    let mut app = App::new(settings)?;
    app.run(command).await
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                e.print().map_err(|e| format!("failed to print help: {e}"))?;
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.no_color {
        colored::control::set_override(false);
    }

    if matches!(args.command, Command::Init) {
        crate::logging::init_logging(args.verbose, None, args.no_color);
        return init_config(&args);
    }

    let cfg = load_file_config(&args)?;
    let settings = build_settings(&args, cfg)?;
    if settings.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init_logging(args.verbose, settings.log_level.as_deref(), settings.no_color);
    debug!(base_url = %settings.base_url, "settings resolved");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(settings, args.command))
}

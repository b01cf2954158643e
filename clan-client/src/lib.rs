use std::io::{self, Write};
use std::path::Path;

use clan_shared::api::{self, rest};
use clan_shared::domain::{ChoreFilter, ShoppingFilter, ValidationError};
use clan_shared::guard::{RouteDecision, Screen};
use clan_shared::jwt;
use tracing::{info, warn};

pub mod backend;
pub mod cli;
pub mod config;
pub mod screens;
pub mod session;

use backend::{FamilyBackend, RestBackend, request_failed};
pub use cli::{Cli, Command};
pub use config::{ClientConfig, load_config, resolve_config_path};
use screens::chores::{ChoreEdit, ChoreInput, ChoresScreen};
use screens::dashboard::Dashboard;
use screens::family::{FamilyScreen, MemberInput};
use screens::meals::MealsScreen;
use screens::shopping::ShoppingScreen;
use screens::{AssumeYes, Confirm, StdinConfirm, command_hint, onboarding};
use session::Session;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Usage(String),
    #[error("not signed in; run `clan login`")]
    NotSignedIn,
    #[error("continue at {}: run `{}`", .0.path(), redirect_hint(.0))]
    Redirect(Screen),
}

fn redirect_hint(screen: &Screen) -> &'static str {
    command_hint(*screen)
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing();

    let cfg_path = resolve_config_path(cli.config)?;
    let cfg = load_config(&cfg_path)?;
    let session_path = session::session_path(&cfg_path);
    info!(path = ?cfg_path, server = %cfg.server_url, "loaded config");

    let confirm: &dyn Confirm = if cli.yes { &AssumeYes } else { &StdinConfirm };

    match cli.command {
        Command::Signup {
            server,
            email,
            name,
        } => {
            let server_url = server_url(server, &cfg, &cfg_path)?;
            let email = match email {
                Some(e) => e,
                None => prompt("Email: ")?,
            };
            let name = match name {
                Some(n) => n,
                None => prompt("Your name: ")?,
            };
            let password = read_password("Password: ")?;
            if read_password("Repeat password: ")? != password {
                return Err(AppError::Usage("passwords do not match".into()));
            }
            // Rejected locally before anything is sent.
            let email = clan_shared::domain::validate_email(&email)?;
            clan_shared::domain::validate_password(&password)?;
            let name = clan_shared::domain::required("name", &name)?;
            let identity = rest::signup(
                &server_url,
                &api::SignUpReq {
                    email: email.clone(),
                    password: password.clone(),
                    name,
                },
            )
            .await
            .map_err(request_failed("signup"))?;
            println!("Welcome, {}!", identity.name);
            sign_in(&server_url, &email, &password, &session_path).await
        }
        Command::Login { server, email } => {
            let server_url = server_url(server, &cfg, &cfg_path)?;
            let email = match email {
                Some(e) => e,
                None => prompt("Email: ")?,
            };
            let password = read_password("Password: ")?;
            sign_in(&server_url, &email, &password, &session_path).await
        }
        Command::Logout => {
            if let Some(s) = session::load(&session_path)? {
                if let Err(e) = rest::logout(&s.server_url, &s.token).await {
                    warn!(error = %e, "logout request failed; forgetting the session anyway");
                }
            }
            session::clear(&session_path)?;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => {
            let (session, backend) = open_session(&session_path).await?;
            print_status(&session, &backend).await
        }
        Command::Onboarding { step } => {
            let backend = open_session(&session_path).await?.1;
            run_onboarding(&backend, step, confirm).await
        }
        Command::Dashboard => {
            let backend = open_session(&session_path).await?.1;
            let dashboard = Dashboard::load(&backend).await?;
            print!("{}", dashboard.render());
            Ok(())
        }
        Command::Chores { action } => {
            let backend = open_session(&session_path).await?.1;
            run_chores(&backend, action, confirm).await
        }
        Command::Shopping { action } => {
            let backend = open_session(&session_path).await?.1;
            run_shopping(&backend, action, confirm).await
        }
        Command::Meals { action } => {
            let backend = open_session(&session_path).await?.1;
            run_meals(&backend, action, confirm).await
        }
        Command::Family { action } => {
            let backend = open_session(&session_path).await?.1;
            let mut screen = FamilyScreen::open(&backend).await?;
            match action.unwrap_or(cli::FamilyCmd::Show) {
                cli::FamilyCmd::Show => {}
                cli::FamilyCmd::Rename { name } => {
                    let family = screen.rename(&name).await?;
                    println!("Family renamed to {}.", family.name);
                }
                cli::FamilyCmd::Members(cmd) => run_member_cmd(&mut screen, cmd, confirm).await?,
            }
            print!("{}", screen.render());
            Ok(())
        }
    }
}

/// CLI flag wins over config; a flag value is remembered for later runs.
fn server_url(
    flag: Option<String>,
    cfg: &ClientConfig,
    cfg_path: &Path,
) -> Result<String, AppError> {
    match flag {
        Some(s) => {
            let url = config::normalize_server_url(&s);
            let cfg = ClientConfig {
                server_url: url.clone(),
            };
            config::save_config(cfg_path, &cfg)?;
            Ok(url)
        }
        None => Ok(config::normalize_server_url(&cfg.server_url)),
    }
}

async fn sign_in(
    server_url: &str,
    email: &str,
    password: &str,
    session_path: &Path,
) -> Result<(), AppError> {
    let resp = rest::login(
        server_url,
        &api::AuthReq {
            email: email.trim().to_string(),
            password: password.to_string(),
        },
    )
    .await
    .map_err(|e| match e.status() {
        Some(401) => AppError::Usage("invalid email or password".into()),
        _ => request_failed("login")(e),
    })?;
    let session = Session {
        server_url: server_url.to_string(),
        email: email.trim().to_ascii_lowercase(),
        token: resp.token,
    };
    session::save(session_path, &session)?;
    println!("Signed in as {}.", session.email);

    let backend = RestBackend::new(&session.server_url, &session.token);
    let provisioned = backend.ensure_family().await?;
    info!(
        family_id = %provisioned.family_id,
        created = provisioned.created,
        "sign-in: family ready"
    );
    let me = backend.me().await?;
    let landing = clan_shared::guard::landing_after_login(&me.status.status());
    println!("Next: {}", command_hint(landing));
    Ok(())
}

/// Loads the saved session and swaps its token for a fresh one.
async fn open_session(path: &Path) -> Result<(Session, RestBackend), AppError> {
    let mut session = session::load(path)?.ok_or(AppError::NotSignedIn)?;
    match rest::renew_token(&session.server_url, &session.token).await {
        Ok(resp) => {
            session.token = resp.token;
            session::save(path, &session)?;
            info!("renewed auth token from server");
        }
        Err(e) if e.status() == Some(401) => {
            session::clear(path)?;
            return Err(AppError::NotSignedIn);
        }
        Err(e) => {
            warn!(error = %e, "token renewal failed; continuing with existing token");
        }
    }
    let backend = RestBackend::new(&session.server_url, &session.token);
    Ok((session, backend))
}

async fn print_status(session: &Session, backend: &RestBackend) -> Result<(), AppError> {
    match rest::server_version(&session.server_url).await {
        Ok(v) => println!("Server {} (version {})", session.server_url, v.version),
        Err(e) => warn!(error = %e, "version request failed"),
    }
    let me = backend.me().await?;
    println!("Signed in as {} <{}>", me.identity.name, me.identity.email);
    match jwt::decode_unverified(&session.token) {
        Ok(claims) => {
            if let Some(exp) = chrono::DateTime::from_timestamp(claims.exp, 0) {
                let local = exp.with_timezone(&chrono::Local);
                println!("Session valid until {}", local.format("%Y-%m-%d %H:%M"));
            }
        }
        Err(e) => warn!(error = %e, "could not read session token"),
    }
    let status = backend.onboarding_status().await?;
    match &status.family_id {
        Some(fid) => println!("Family: {fid}"),
        None => println!("Family: none yet"),
    }
    let route = backend.route(Screen::Dashboard).await?;
    match route.decision() {
        Ok(RouteDecision::Allow) => println!("Next: {}", command_hint(Screen::Dashboard)),
        Ok(RouteDecision::Redirect(to)) => {
            println!("Next: {} ({})", to.path(), command_hint(to))
        }
        Err(e) => warn!(error = %e, "server sent an unknown route"),
    }
    Ok(())
}

async fn run_onboarding(
    backend: &dyn FamilyBackend,
    step: cli::OnboardingCmd,
    confirm: &dyn Confirm,
) -> Result<(), AppError> {
    match step {
        cli::OnboardingCmd::Family { name } => {
            let family = onboarding::create_family(backend, &name).await?;
            println!("Family \"{}\" saved.", family.name);
            println!("Next: {}", command_hint(Screen::OnboardingMembers));
        }
        cli::OnboardingCmd::Members { action } => {
            let mut screen = FamilyScreen::open_at(backend, Screen::OnboardingMembers).await?;
            run_member_cmd(&mut screen, action.unwrap_or(cli::MemberCmd::List), confirm).await?;
            print!("{}", screen.render());
            println!("When everyone is in, run `{}`", command_hint(Screen::OnboardingComplete));
        }
        cli::OnboardingCmd::Finish => {
            onboarding::finish(backend).await?;
            println!("{}", onboarding::completion_message());
            onboarding::wait_to_advance().await;
            let dashboard = Dashboard::load(backend).await?;
            print!("{}", dashboard.render());
        }
    }
    Ok(())
}

async fn run_member_cmd(
    screen: &mut FamilyScreen<'_>,
    cmd: cli::MemberCmd,
    confirm: &dyn Confirm,
) -> Result<(), AppError> {
    match cmd {
        cli::MemberCmd::List => {}
        cli::MemberCmd::Add { name, role, email } => {
            let member = screen.add_member(MemberInput { name, role, email }).await?;
            println!("Added {} ({}).", member.name, member.role);
        }
        cli::MemberCmd::Edit { member, name, role } => {
            let member = screen.edit_member(&member, name.as_deref(), role).await?;
            println!("Updated {}.", member.name);
        }
        cli::MemberCmd::Remove { member } => {
            if screen.remove_member(&member, confirm).await? {
                println!("Removed.");
            }
        }
    }
    Ok(())
}

async fn run_chores(
    backend: &dyn FamilyBackend,
    action: Option<cli::ChoreCmd>,
    confirm: &dyn Confirm,
) -> Result<(), AppError> {
    let mut screen = ChoresScreen::open(backend).await?;
    let mut filter = ChoreFilter::All;
    match action.unwrap_or(cli::ChoreCmd::List {
        filter: ChoreFilter::All,
    }) {
        cli::ChoreCmd::List { filter: f } => filter = f,
        cli::ChoreCmd::Add {
            title,
            description,
            assign,
            points,
            due,
        } => {
            let chore = screen
                .add(ChoreInput {
                    title,
                    description,
                    assignee: assign,
                    points,
                    due_date: due,
                })
                .await?;
            println!("Added \"{}\".", chore.title);
        }
        cli::ChoreCmd::Edit {
            id,
            title,
            description,
            assign,
            unassign,
            points,
            due,
            clear_due,
        } => {
            let edit = ChoreEdit {
                title,
                description,
                assignee: assign,
                unassign,
                points,
                due_date: due,
                clear_due,
            };
            let chore = screen.edit(&id, edit).await?;
            println!("Updated \"{}\".", chore.title);
        }
        cli::ChoreCmd::Toggle { id } => {
            let chore = screen.toggle(&id).await?;
            println!("\"{}\" is now {}.", chore.title, chore.status);
        }
        cli::ChoreCmd::Status { id, status } => {
            let chore = screen.set_status(&id, status).await?;
            println!("\"{}\" is now {}.", chore.title, chore.status);
        }
        cli::ChoreCmd::Remove { id } => {
            if screen.delete(&id, confirm).await? {
                println!("Deleted.");
            }
        }
    }
    print!("{}", screen.render(filter));
    Ok(())
}

async fn run_shopping(
    backend: &dyn FamilyBackend,
    action: Option<cli::ShoppingCmd>,
    confirm: &dyn Confirm,
) -> Result<(), AppError> {
    let mut screen = ShoppingScreen::open(backend).await?;
    let mut filter = ShoppingFilter::All;
    match action.unwrap_or(cli::ShoppingCmd::List {
        filter: ShoppingFilter::All,
    }) {
        cli::ShoppingCmd::List { filter: f } => filter = f,
        cli::ShoppingCmd::Add { name, category } => {
            let item = screen.add(&name, category.as_deref()).await?;
            println!("Added {}.", item.name);
        }
        cli::ShoppingCmd::Toggle { id } => {
            let item = screen.toggle(&id).await?;
            let state = if item.checked { "purchased" } else { "needed" };
            println!("{} marked {state}.", item.name);
        }
        cli::ShoppingCmd::Remove { id } => {
            if screen.delete(&id, confirm).await? {
                println!("Removed.");
            }
        }
        cli::ShoppingCmd::ClearPurchased => match screen.clear_purchased(confirm).await? {
            Some(n) => println!("Cleared {n} purchased item(s)."),
            None => println!("Nothing cleared."),
        },
    }
    print!("{}", screen.render(filter));
    Ok(())
}

async fn run_meals(
    backend: &dyn FamilyBackend,
    action: Option<cli::MealCmd>,
    confirm: &dyn Confirm,
) -> Result<(), AppError> {
    let mut screen = MealsScreen::open(backend).await?;
    match action.unwrap_or(cli::MealCmd::List) {
        cli::MealCmd::List => {}
        cli::MealCmd::Set {
            day,
            meal,
            name,
            notes,
        } => {
            screen
                .save(day, meal, name.as_deref(), notes.as_deref())
                .await?;
            println!("Saved {meal} for {day}.");
        }
        cli::MealCmd::Clear { day, meal } => {
            if screen.clear(day, meal, confirm).await? {
                println!("Cleared {meal} on {day}.");
            }
        }
    }
    print!("{}", screen.render());
    Ok(())
}

fn prompt(msg: &str) -> Result<String, AppError> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).map_err(AppError::Io)?;
    Ok(buf.trim().to_string())
}

fn read_password(msg: &str) -> Result<String, AppError> {
    rpassword::prompt_password(msg).map_err(AppError::Io)
}

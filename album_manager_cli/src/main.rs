use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use album_manager_cli::api::ApiClient;
use album_manager_cli::config::{self, Config};
use album_manager_cli::forms::{AlbumForm, LoginForm, RegisterForm};
use album_manager_cli::role::Role;
use album_manager_cli::router::{Navigation, Route, Router};
use album_manager_cli::services::{AlbumService, AuthService, UserService};
use album_manager_cli::session::{SessionContext, SessionStore};
use album_manager_cli::sort::{AlbumSort, SortDirection, SortField};
use album_manager_cli::storage::FileStorage;
use album_manager_cli::token;
use album_manager_cli::views::{AlbumListView, HomeView, LoginPage, RegisterPage, UserManagementView};
use album_manager_cli::ClientError;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage a music album catalog from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the album REST API
    #[arg(long, env = "ALBUM_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Directory holding the persisted session
    #[arg(long, env = "ALBUM_SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "ALBUM_API_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Prompted for when omitted. The prompt echoes input, so prefer ALBUM_PASSWORD on shared terminals
        #[arg(short, long, env = "ALBUM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: Option<String>,
        /// Prompted for when omitted. The prompt echoes input, so prefer ALBUM_PASSWORD on shared terminals
        #[arg(short, long, env = "ALBUM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// USER or EDITOR
        #[arg(short, long, default_value = "USER")]
        role: Role,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Render the page behind a path (/, /login, /register)
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    #[command(subcommand)]
    Albums(AlbumCommand),
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Subcommand, Debug)]
enum AlbumCommand {
    /// List all albums
    List {
        #[arg(short, long, default_value = "title")]
        sort: SortField,
        /// Sort descending
        #[arg(short, long)]
        desc: bool,
    },
    /// Create an album (EDITOR or ADMIN)
    Create(AlbumFields),
    /// Edit an album you may modify
    Edit {
        id: i64,
        #[command(flatten)]
        fields: AlbumFields,
    },
    /// Delete an album you may modify
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct AlbumFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    artist: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    stock: Option<i32>,
    #[arg(long)]
    image_url: Option<String>,
}

impl AlbumFields {
    fn apply(self, form: &mut AlbumForm) {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.artist {
            form.artist = v;
        }
        if let Some(v) = self.genre {
            form.genre = v;
        }
        if let Some(v) = self.year {
            form.release_year = Some(v);
        }
        if let Some(v) = self.label {
            form.record_label = v;
        }
        if let Some(v) = self.price {
            form.price = Some(v);
        }
        if let Some(v) = self.stock {
            form.stock = Some(v);
        }
        if let Some(v) = self.image_url {
            form.image_url = v;
        }
    }
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// List users other than administrators (ADMIN only)
    List,
    /// Change a user's role (ADMIN only)
    Role { id: i64, role: Role },
    /// Delete a user (ADMIN only)
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

struct App {
    ctx: SessionContext,
    albums: AlbumService,
    users: UserService,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session_dir = cli.session_dir.unwrap_or_else(config::default_session_dir);
    let config = Config::new(&cli.api_url, session_dir, cli.timeout_secs)?;

    let store = SessionStore::new(Arc::new(FileStorage::new(&config.session_dir)));
    let api = ApiClient::new(&config, store)?;
    let mut app = App {
        ctx: SessionContext::hydrate(AuthService::new(api.clone()))?,
        albums: AlbumService::new(api.clone()),
        users: UserService::new(api),
    };

    let result = dispatch(&mut app, cli.command).await;
    if let Err(e) = &result {
        if let Some(client_err) = e.downcast_ref::<ClientError>() {
            app.ctx.observe(client_err);
            if client_err.is_unauthorized() {
                eprintln!("⚠️ Redirecting to {}", Route::Login);
            }
        }
    }
    result
}

async fn dispatch(app: &mut App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let form = LoginForm::new(
                value_or_prompt(username, "Username: ")?,
                value_or_prompt(password, "Password (visible): ")?,
            );
            let mut page = LoginPage::new(form);
            let nav = page.submit(&mut app.ctx).await;
            finish_auth(app, nav, page.error())
        }
        Command::Register { username, password, role } => {
            let form = RegisterForm {
                username: value_or_prompt(username, "Username: ")?,
                password: value_or_prompt(password, "Password (visible): ")?,
                role,
            };
            let mut page = RegisterPage::new(form);
            let nav = page.submit(&mut app.ctx).await;
            finish_auth(app, nav, page.error())
        }
        Command::Logout => {
            app.ctx.logout()?;
            println!("✅ Logged out.");
            Ok(())
        }
        Command::Whoami => whoami(app),
        Command::Open { path } => open(app, &path).await,
        Command::Albums(cmd) => {
            guard(app)?;
            albums(app, cmd).await
        }
        Command::Users(cmd) => {
            guard(app)?;
            users(app, cmd).await
        }
    }
}

fn finish_auth(app: &App, nav: Navigation, error: Option<&str>) -> anyhow::Result<()> {
    match (nav, error) {
        (Navigation::Redirect(Route::Home), _) => {
            if let Some(user) = app.ctx.current_user() {
                println!("✅ Logged in as {} ({}).", user.username, user.normalized_role());
            }
            Ok(())
        }
        (_, Some(msg)) => anyhow::bail!("{}", msg),
        _ => anyhow::bail!("authentication failed"),
    }
}

/// Every album and user command lives on the protected home route.
fn guard(app: &App) -> anyhow::Result<()> {
    match Router::resolve(Route::Home.path(), app.ctx.is_authenticated()) {
        Navigation::Render(_) => Ok(()),
        Navigation::Redirect(route) => {
            anyhow::bail!("not logged in. Redirecting to {} (run `album-manager login`)", route)
        }
    }
}

fn whoami(app: &App) -> anyhow::Result<()> {
    let Some(user) = app.ctx.current_user() else {
        println!("Not logged in.");
        return Ok(());
    };
    println!("{} ({})", user.username, user.normalized_role());

    if let Some(raw) = app.ctx.auth().token()? {
        match token::read_claims(&raw) {
            Ok(claims) => {
                if let Some(exp) = claims.expires_at() {
                    println!("Token expires at {}", exp.to_rfc3339());
                }
            }
            Err(_) => println!("Token is opaque; expiry unknown."),
        }
    }
    Ok(())
}

async fn open(app: &mut App, path: &str) -> anyhow::Result<()> {
    let nav = Router::resolve(path, app.ctx.is_authenticated());
    if let Navigation::Redirect(route) = nav {
        println!("↪ {} redirects to {}", path, route);
    }
    match nav.route() {
        Route::Login => println!("Login: run `album-manager login --username <name>`."),
        Route::Register => println!("Register: run `album-manager register --username <name> --role USER|EDITOR`."),
        Route::Home => {
            let mut home = HomeView::new(&app.ctx, app.albums.clone(), app.users.clone())
                .ok_or(ClientError::NotAuthenticated)?;
            home.load().await?;
            print!("{}", home.render());
        }
    }
    Ok(())
}

async fn albums(app: &mut App, cmd: AlbumCommand) -> anyhow::Result<()> {
    let mut view = AlbumListView::new(app.albums.clone(), app.ctx.capabilities());
    view.load().await?;

    match cmd {
        AlbumCommand::List { sort, desc } => {
            let direction = if desc { SortDirection::Descending } else { SortDirection::Ascending };
            view.set_sort(AlbumSort::new(sort, direction));
            print!("{}", view.render());
        }
        AlbumCommand::Create(fields) => {
            if !view.open_create() {
                anyhow::bail!("only EDITOR or ADMIN accounts can create albums");
            }
            if let Some(form) = view.form_mut() {
                fields.apply(form);
            }
            submit(&mut view).await?;
        }
        AlbumCommand::Edit { id, fields } => {
            if !view.open_edit(id) {
                anyhow::bail!("album #{} does not exist or you may not modify it", id);
            }
            if let Some(form) = view.form_mut() {
                fields.apply(form);
            }
            submit(&mut view).await?;
        }
        AlbumCommand::Delete { id, yes } => {
            if !view.request_delete(id) {
                anyhow::bail!("album #{} does not exist or you may not delete it", id);
            }
            let title = view.find(id).map(|a| a.title.clone()).unwrap_or_default();
            if !yes && !confirm(&format!("Delete album #{} \"{}\"? This cannot be undone.", id, title))? {
                view.cancel_delete();
                println!("Cancelled.");
                return Ok(());
            }
            if let Err(e) = view.confirm_delete().await {
                return Err(view_error(view.error(), e));
            }
            println!("✅ Album #{} deleted.", id);
            print!("{}", view.render());
        }
    }
    Ok(())
}

async fn submit(view: &mut AlbumListView) -> anyhow::Result<()> {
    match view.submit_form().await {
        Ok(saved) => {
            let id = saved.id.map(|id| format!(" #{}", id)).unwrap_or_default();
            println!("✅ Album{} \"{}\" saved.", id, saved.title);
            print!("{}", view.render());
            Ok(())
        }
        Err(e) => Err(view_error(view.form_error().or(view.error()), e)),
    }
}

async fn users(app: &mut App, cmd: UserCommand) -> anyhow::Result<()> {
    if !app.ctx.capabilities().can_manage_users() {
        anyhow::bail!("only administrators can manage users");
    }
    let acting = app.ctx.current_user().cloned().ok_or(ClientError::NotAuthenticated)?;
    let mut view = UserManagementView::new(app.users.clone(), acting);
    if let Err(e) = view.load().await {
        return Err(view_error(view.error(), e));
    }

    match cmd {
        UserCommand::List => print!("{}", view.render()),
        UserCommand::Role { id, role } => {
            if !view.start_role_edit(id) {
                anyhow::bail!("user #{} is not in the managed list", id);
            }
            view.choose_role(role);
            if let Err(e) = view.save_role().await {
                return Err(view_error(view.error(), e));
            }
            println!("✅ User #{} is now {}.", id, role);
            print!("{}", view.render());
        }
        UserCommand::Delete { id, yes } => {
            if !view.request_delete(id) {
                anyhow::bail!("{}", view.error().unwrap_or("cannot delete this user"));
            }
            if !yes && !confirm(&format!("Delete user #{}? This cannot be undone.", id))? {
                view.cancel_delete();
                println!("Cancelled.");
                return Ok(());
            }
            if let Err(e) = view.confirm_delete().await {
                return Err(view_error(view.error(), e));
            }
            println!("✅ User #{} deleted.", id);
            print!("{}", view.render());
        }
    }
    Ok(())
}

/// Keeps the typed error for 401 handling and shows the view's banner text otherwise.
fn view_error(banner: Option<&str>, err: ClientError) -> anyhow::Error {
    match banner {
        Some(msg) if !err.is_unauthorized() => anyhow::Error::new(err).context(msg.to_string()),
        _ => err.into(),
    }
}

fn value_or_prompt(value: Option<String>, prompt: &str) -> io::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => read_line(prompt),
    }
}

fn confirm(question: &str) -> io::Result<bool> {
    let answer = read_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

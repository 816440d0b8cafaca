use anyhow::{Context, Result};
use setup_admin::guard::{Route, SessionContext};
use setup_admin::wizard::{Transition, UploadEvent, RECONCILIATION_TITLE};
use setup_admin::{AdminApp, Config};
use setup_admin_remote::{FileSessionStore, GraphqlClient, MemorySessionStore, SessionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  login <user> <password>   sign in
  logout                    forget the session
  email <address>           operator email sent with the purchase code
  code <purchase-code>      set the purchase code
  keys <admin-panel> <backend>
                            set both Google Maps API keys
  next | back               move through the wizard
  upload <path>             upload the Firebase service-account key
  select <ip>               pick the device to disable
  deactivate                disable the selected device
  done                      commit the Firebase key and finish
  status | help | quit";

struct Args {
    config_path: PathBuf,
    ephemeral: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: Config::default_path(),
        ephemeral: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ephemeral" => args.ephemeral = true,
            "--config" => {
                if let Some(path) = iter.next() {
                    args.config_path = PathBuf::from(path);
                }
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
    }
    args
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("setup_admin=info,setup_admin_remote=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = parse_args();
    let mut config = Config::load_or_default(&args.config_path);
    config.apply_env().context("invalid configuration")?;

    let store: Arc<dyn SessionStore> = if args.ephemeral || config.auth.ephemeral {
        Arc::new(MemorySessionStore::new())
    } else {
        Arc::new(FileSessionStore::in_data_dir(&config.auth.session_slot)?)
    };

    let client = Arc::new(
        GraphqlClient::new(&config.server.root, config.server.timeout())?
            .with_session_store(store.clone()),
    );
    tracing::info!(root = %client.root(), "Using backend");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, client, SessionContext::new(store)))
}

async fn run(config: Config, client: Arc<GraphqlClient>, session: SessionContext) -> Result<()> {
    let mut app = AdminApp::new(config, client.clone(), session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    if app.navigate(Route::Config).await == Route::Config {
        println!("Signed in. Type `status` to see the wizard.");
    } else {
        println!("Sign in with `login <user> <password>`. Type `help` for commands.");
    }
    flush_notices(&mut app);

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = parts.split_first() else {
            continue;
        };

        match (command, rest) {
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{HELP}"),
            ("login", [user, password]) => {
                if app.login(user, password).await == Route::Config {
                    print_status(&mut app).await;
                }
            }
            ("logout", _) => {
                app.logout();
                println!("Signed out.");
            }
            ("status", _) => print_status(&mut app).await,
            ("email", [address]) => {
                if let Some(wizard) = app.protected_wizard().await {
                    wizard.set_email(address);
                }
            }
            ("code", [code]) => {
                if let Some(wizard) = app.protected_wizard().await {
                    wizard.set_purchase_code(code);
                }
            }
            ("keys", [admin_panel, backend]) => {
                if let Some(wizard) = app.protected_wizard().await {
                    wizard.set_admin_panel_api_key(admin_panel);
                    wizard.set_backend_maps_api_key(backend);
                }
            }
            ("next", _) => {
                if let Some(wizard) = app.protected_wizard().await {
                    if let Ok(transition) = wizard.advance().await {
                        report_transition(&transition);
                    }
                }
            }
            ("back", _) => {
                if let Some(wizard) = app.protected_wizard().await {
                    report_transition(&wizard.retreat());
                }
            }
            ("upload", [path]) => upload(&mut app, &client, Path::new(path)).await,
            ("select", [ip]) => {
                if let Some(wizard) = app.protected_wizard().await {
                    if wizard.select_device(ip).is_ok() {
                        println!("Selected {ip}.");
                    }
                }
            }
            ("deactivate", _) => {
                if let Some(wizard) = app.protected_wizard().await {
                    if let Ok(transition) = wizard.deactivate().await {
                        report_transition(&transition);
                    }
                }
            }
            ("done", _) => {
                if let Some(wizard) = app.protected_wizard().await {
                    if let Ok(transition) = wizard.complete().await {
                        report_transition(&transition);
                    }
                }
            }
            _ => println!("Unrecognised command. Type `help`."),
        }

        flush_notices(&mut app);
    }

    Ok(())
}

async fn upload(app: &mut AdminApp, client: &GraphqlClient, path: &Path) {
    let Some(wizard) = app.protected_wizard().await else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    wizard.handle_upload(UploadEvent::Uploading { name: name.clone() });
    let event = match client.upload_key_file(path).await {
        Ok(stored) => UploadEvent::Done { name: stored },
        Err(e) => {
            tracing::warn!("Upload failed: {e}");
            UploadEvent::Failed { name }
        }
    };
    wizard.handle_upload(event);
}

fn report_transition(transition: &Transition) {
    match transition {
        Transition::Advanced { to, .. } | Transition::Retreated { to, .. } => {
            println!("Step {}: {}", to.index() + 1, to.title())
        }
        Transition::Suspended { candidates } => {
            println!("{RECONCILIATION_TITLE}: this purchase code is active on other servers.");
            for ip in candidates {
                println!("  {ip}");
            }
            println!("Pick one with `select <ip>`, then `deactivate`.");
        }
        Transition::Resumed | Transition::Unchanged => {}
        Transition::Configured => println!("Configuration complete."),
    }
}

async fn print_status(app: &mut AdminApp) {
    let Some(wizard) = app.protected_wizard().await else {
        return;
    };
    let step = wizard.step();
    let snapshot = wizard.snapshot();
    println!("Step {}: {}", step.index() + 1, step.title());
    println!("  purchase code      {}", display(&snapshot.purchase_code));
    println!("  email              {}", wizard.email().unwrap_or("-"));
    println!("  admin panel key    {}", display(&snapshot.admin_panel_api_key));
    println!("  backend maps key   {}", display(&snapshot.backend_maps_api_key));
    println!(
        "  firebase key file  {}",
        display(&snapshot.firebase_project_private_key)
    );
    if let Some(flow) = wizard.reconciliation() {
        println!(
            "  {RECONCILIATION_TITLE}: {} (selected: {})",
            flow.candidates().join(", "),
            flow.selected().unwrap_or("-")
        );
    }
    if wizard.is_configured() {
        println!("  configured");
    }
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn flush_notices(app: &mut AdminApp) {
    for notice in app.take_notices() {
        println!("{notice}");
    }
}

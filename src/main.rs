//! Mooori admin CLI - backend discovery, session and store management.
//!
//! # Usage
//!
//! ```bash
//! # Find a reachable backend and remember it
//! mooori-admin resolve
//!
//! # Log in (offline, the demo pair enters demo mode)
//! mooori-admin login -e admin@gmail.com -p 123456789
//!
//! # Mark an order as shipped
//! mooori-admin set-status 1001 shipped
//!
//! # Scan the local network and rewrite the configured backend URL
//! mooori-admin diagnose --write-config
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mooori_admin_lib::config::AppConfig;
use mooori_admin_lib::diagnostics;
use mooori_admin_lib::models::{OrderStatus, Review};
use mooori_admin_lib::probe::HttpProbe;
use mooori_admin_lib::screens::{
    ListState, Notice, NoticeLevel, OrdersScreen, ProductsScreen, ReviewsScreen,
};
use mooori_admin_lib::AdminApp;

#[derive(Parser)]
#[command(name = "mooori-admin")]
#[command(author, version, about = "Mooori store admin client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first reachable backend and remember it
    Resolve,
    /// Probe known hosts and ports; optionally point the config at this machine
    Diagnose {
        /// Rewrite the configured backend URL to this host's address
        #[arg(long)]
        write_config: bool,
    },
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the current session
    Whoami,
    /// List products
    Products,
    /// Remove a product by id
    RemoveProduct { id: String },
    /// List orders
    Orders {
        /// Only orders placed on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change an order's status
    SetStatus {
        order_id: String,

        /// `Order Placed`, `Packing`, `Shipped`, `Out for delivery` or `Delivered`
        status: OrderStatus,
    },
    /// List reviews
    Reviews,
    /// Delete a review by id
    DeleteReview { id: String },
    /// Check whether the backend answers
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> mooori_admin_lib::Result<()> {
    let mut app = AdminApp::new(AppConfig::load());
    app.start().await?;
    print_notices(app.take_notices());

    match cli.command {
        Commands::Resolve => match app.backend_url() {
            Some(url) => println!("{url}"),
            None => println!("No backend reachable, running on sample data"),
        },
        Commands::Diagnose { write_config } => diagnose(&app, write_config).await?,
        Commands::Login { email, password } => {
            app.login(&email, &password).await?;
        }
        Commands::Logout => app.logout().await,
        Commands::Whoami => match app.session().token_preview() {
            Some(preview) => {
                let mode = if app.session().is_offline() { " (offline demo)" } else { "" };
                println!("Logged in{mode}, token {preview}");
            }
            None => println!("Not logged in"),
        },
        Commands::Products => {
            let mut screen = ProductsScreen::new();
            app.refresh_products(&mut screen).await?;
            print_source(screen.state());
            for p in screen.state().items() {
                println!("{:<26} {:<28} {:<8} {:>8.2}", p.id, p.name, p.category, p.price);
            }
            print_notices(screen.state_mut().take_notices());
        }
        Commands::RemoveProduct { id } => {
            let mut screen = ProductsScreen::new();
            app.refresh_products(&mut screen).await?;
            let api = app.api()?;
            let outcome = screen.remove(api.as_ref(), &id).await;
            log::debug!("remove {id}: {outcome:?}");
            app.after_screen(screen.state_mut().take_auth_expired()).await;
            print_notices(screen.state_mut().take_notices());
        }
        Commands::Orders { date } => {
            let mut screen = OrdersScreen::new();
            app.refresh_orders(&mut screen).await?;
            screen.set_date_filter(date);
            print_source(screen.state());
            for o in screen.visible() {
                let day = o.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
                println!(
                    "{:<26} {:<10} {:<18} {:<20} {:>8.2}",
                    o.id,
                    day,
                    o.status.as_str(),
                    o.address.name,
                    o.total()
                );
            }
            print_notices(screen.state_mut().take_notices());
        }
        Commands::SetStatus { order_id, status } => {
            let mut screen = OrdersScreen::new();
            app.refresh_orders(&mut screen).await?;
            let api = app.api()?;
            let outcome = screen.set_status(api.as_ref(), &order_id, status).await;
            log::debug!("set-status {order_id}: {outcome:?}");
            app.after_screen(screen.state_mut().take_auth_expired()).await;
            print_notices(screen.state_mut().take_notices());
        }
        Commands::Reviews => {
            let mut screen = ReviewsScreen::new();
            app.refresh_reviews(&mut screen).await?;
            print_source(screen.state());
            for r in screen.state().items() {
                print_review(r);
            }
            print_notices(screen.state_mut().take_notices());
        }
        Commands::DeleteReview { id } => {
            let mut screen = ReviewsScreen::new();
            app.refresh_reviews(&mut screen).await?;
            let api = app.api()?;
            let outcome = screen.delete(api.as_ref(), &id).await;
            log::debug!("delete-review {id}: {outcome:?}");
            app.after_screen(screen.state_mut().take_auth_expired()).await;
            print_notices(screen.state_mut().take_notices());
        }
        Commands::Check => {
            let api = app.api()?;
            let mut profile = app.profile("admin");
            profile.check_connection(api.as_ref()).await;
            print_notices(profile.take_notices());
        }
    }

    print_notices(app.take_notices());
    Ok(())
}

async fn diagnose(app: &AdminApp, write_config: bool) -> mooori_admin_lib::Result<()> {
    let discovered = diagnostics::local_ipv4();
    match discovered {
        Some(ip) => println!("Outbound IPv4 address: {ip}"),
        None => println!(
            "No external IPv4 address found, using {}",
            diagnostics::FALLBACK_IP
        ),
    }
    let ip = discovered.unwrap_or(diagnostics::FALLBACK_IP);

    let probe = HttpProbe::new(app.config().probe_timeout)?;
    let hosts = diagnostics::hosts_with(&[ip.to_string()]);
    let reports = diagnostics::scan(&probe, &hosts, &diagnostics::DEFAULT_PORTS).await;
    for r in &reports {
        let mark = if r.reachable { "ok  " } else { "FAIL" };
        println!("[{mark}] {}", r.url);
    }
    if !reports.iter().any(|r| r.reachable) {
        println!("No backend answered. Is the server running and the firewall open?");
    }

    if write_config {
        let url = diagnostics::write_discovered(ip)?;
        println!("Configured backend URL set to {url}");
    }
    Ok(())
}

fn print_source<T>(state: &ListState<T>) {
    if state.is_sample() {
        println!("(showing sample data)");
    }
}

fn print_review(r: &Review) {
    println!(
        "{} | {} | {} | {}/5",
        r.id,
        r.reviewer_first_name(),
        r.product_display_name(),
        r.rating
    );
    println!("    {}", r.preview());
}

fn print_notices(notices: Vec<Notice>) {
    for n in notices {
        let tag = match n.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        match n.detail {
            Some(detail) => eprintln!("[{tag}] {}: {detail}", n.title),
            None => eprintln!("[{tag}] {}", n.title),
        }
    }
}

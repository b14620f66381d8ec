//! # sqltrail-demo - Traced Demo Service
//!
//! Runs a small HTTP service whose handlers open scopes and issue traced
//! statements, with the inspector served on a second address:
//!
//! ```bash
//! RUST_LOG=info sqltrail-demo
//! curl http://127.0.0.1:9000/users     # generate a scope
//! open http://127.0.0.1:8000           # inspect it
//! ```

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use log::info;
use std::time::Duration;

use sqltrail::cli::Args;
use sqltrail::{inspector, sql_args, ArgValue, ConfigError, Correlation, Profiler, ScopeLabels};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_CONFIG: i32 = 78;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.profiler_config()?;
    let profiler = Profiler::new(&config);

    info!(
        "Tracking {} (capacity {}, skip frames {})",
        if config.enabled { "enabled" } else { "disabled" },
        config.capacity,
        config.skip_frames
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(serve_all(args, profiler))
}

async fn serve_all(args: Args, profiler: Profiler) -> Result<()> {
    let inspecting = async {
        let served = if args.raw {
            inspector::serve_raw(profiler.clone(), &args.inspect).await
        } else {
            inspector::serve(profiler.clone(), &args.inspect).await
        };
        served.context("Inspector stopped")
    };

    let serving = async {
        let app = Router::new().route("/users", get(list_users)).with_state(profiler.clone());
        let listener = tokio::net::TcpListener::bind(&args.listen)
            .await
            .with_context(|| format!("Failed to bind demo service on {}", args.listen))?;
        info!("Demo service listening on http://{}", args.listen);
        axum::serve(listener, app).await.context("Demo service stopped")
    };

    tokio::try_join!(serving, inspecting)?;
    Ok(())
}

async fn list_users(State(profiler): State<Profiler>) -> String {
    let (handle, scope) =
        profiler.begin_scope(Some(&Correlation::root()), ScopeLabels::new("/users", "GET"));

    tokio::time::sleep(Duration::from_millis(200)).await;

    let users = query_with_scope(
        &profiler,
        &handle,
        r#"
        SELECT * FROM "users" WHERE "name" LIKE $1 AND "username" LIKE $2;"#,
        sql_args!["Alex", "alex42"],
    )
    .await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    scope.finish();
    users
}

/// Stand-in for a database call.
async fn query_with_scope(
    profiler: &Profiler,
    handle: &Correlation,
    statement: &str,
    args: Vec<ArgValue>,
) -> String {
    let op = profiler.begin_operation(handle, statement, args);
    tokio::time::sleep(Duration::from_millis(150)).await;
    op.finish();
    "query executed".to_string()
}

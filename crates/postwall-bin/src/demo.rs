//! The `demo` command.

use chrono::Utc;
use clap::Args;
use postwall_config::Config;
use postwall_core::{Collaborators, Identity, MemoryStore, StaticAuth, StaticToken, UiState};
use postwall_engine::{EngineConfig, Route, ScreenHost};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

const DEMO_PHOTO: &str = "https://photos.example.com/demo";

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Post to submit, in order. Repeatable
    #[arg(short, long = "post")]
    posts: Vec<String>,

    /// Display name of the demo user
    #[arg(long, default_value = "Demo User")]
    name: String,

    /// Start without a signed-in user
    #[arg(long)]
    signed_out: bool,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            name: "Demo User".to_string(),
            signed_out: false,
            json: false,
        }
    }
}

pub async fn run(config: &Config, args: DemoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    let auth = if args.signed_out {
        StaticAuth::signed_out()
    } else {
        StaticAuth::signed_in(
            Identity::new("demo")
                .with_display_name(args.name.clone())
                .with_photo_url(DEMO_PHOTO),
        )
    };
    let collaborators = Collaborators::new(
        Arc::new(auth),
        Arc::new(StaticToken::new("demo-token")),
        Arc::new(store.clone()),
    );
    let host = ScreenHost::new(collaborators, EngineConfig::from(config), Handle::current());

    let engine = host.enter_feed()?;
    let mut states = engine.state();
    states.wait_for(|s| !s.is_loading()).await;
    if engine.current_state().needs_authentication() {
        // The host stops the engine and switches to sign-in on its own.
        let mut routes = host.routes();
        routes.wait_for(|route| *route == Route::SignIn).await?;
        println!("route: {}", host.route().as_str());
        return Ok(());
    }

    for (i, text) in args.posts.iter().enumerate() {
        engine.update_draft(text.clone());
        engine.submit()?;
        let expected = i + 1;
        states
            .wait_for(|s| s.posts().is_some_and(|posts| posts.len() >= expected))
            .await;
    }
    info!(posts = args.posts.len(), "demo posts submitted");

    let state = engine.current_state();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_feed(&state);
    }

    host.exit();
    Ok(())
}

fn print_feed(state: &UiState) {
    let now = Utc::now();
    println!("route: feed");
    if let Some(avatar) = state.avatar_ref() {
        println!("avatar: {avatar}");
    }
    match state.posts() {
        Some([]) => println!("(no posts)"),
        Some(posts) => {
            for post in posts {
                println!(
                    "[{}] {}: {}",
                    post.date_label(now),
                    post.author_name,
                    post.text
                );
            }
        }
        None => println!("state: {}", state.as_str()),
    }
}

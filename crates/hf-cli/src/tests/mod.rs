
use crate::{App, Commands, FavoriteCommands, OFFLINE_DEMO_EMAIL, OFFLINE_DEMO_PASSWORD};

use hf_config::Config;
use hf_sync::MemoryStore;

use std::sync::Arc;

use serde_json::Value;

async fn offline_app(store: &Arc<MemoryStore>) -> App {
    App::with_store(store.clone(), &Config::default(), None, true)
        .await
        .unwrap()
}

async fn demo_login(app: &App) -> Value {
    app.execute(Commands::Login {
        email: OFFLINE_DEMO_EMAIL.into(),
        password: OFFLINE_DEMO_PASSWORD.into(),
    })
    .await
    .unwrap()
}

fn toggle(id: &str) -> Commands {
    Commands::Favorite {
        action: FavoriteCommands::Toggle { id: id.into() },
    }
}

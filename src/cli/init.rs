use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "folio.toml";

pub fn generate_secret() -> String {
    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn render_config(secret: &str) -> String {
    format!(
        r#"[server]
host = "127.0.0.1"
port = 8000

[database]
path = "./data/folio.db"
pool_size = 10

[auth]
jwt_secret = "{}"
access_token_lifetime = "5m"
refresh_token_lifetime = "1d"

[api]
page_size = 10
max_page_size = 100
"#,
        secret
    )
}

pub async fn run(path: PathBuf) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    std::fs::create_dir_all(path.join("data"))?;
    std::fs::write(&config_path, render_config(&generate_secret()))?;

    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'folio migrate' to set up the database");
    tracing::info!("Run 'folio serve' to start the server");

    Ok(())
}

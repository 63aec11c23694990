use crate::services::token::TokenIssuer;
use crate::{Config, Database};
use anyhow::Result;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let tokens = TokenIssuer::from_config(&config.auth)?;
        Ok(Self { config, db, tokens })
    }
}

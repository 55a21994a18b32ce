//! `neo show`

use anyhow::bail;
use clap::Parser;
use neo_core::{AsteroidStore, NeoConfig};

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Asteroid id (`neo_reference_id`)
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub id: Option<String>,

    /// Print every stored asteroid
    #[arg(long)]
    pub all: bool,
}

impl ShowArgs {
    pub async fn run(self, cfg: &NeoConfig) -> anyhow::Result<()> {
        let store = AsteroidStore::open(cfg)?;

        let rendered = match self.id {
            Some(id) => match store.asteroid(&id).await? {
                Some(asteroid) => serde_json::to_string_pretty(&asteroid)?,
                None => bail!("asteroid {id} not found"),
            },
            None => serde_json::to_string_pretty(&store.asteroids().await?)?,
        };

        println!("{rendered}");
        Ok(())
    }
}

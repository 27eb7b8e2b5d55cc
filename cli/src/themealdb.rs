use anyhow::{Context, Result, bail};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use cookbook_core::catalog;
use cookbook_core::models::Recipe;
use cookbook_core::themealdb::{SearchResponse, meal_to_recipe};

/// TheMealDB client. Any failure to reach or parse the API falls back to the
/// bundled sample meals so the tool stays usable offline.
pub struct MealDbClient {
    client: reqwest::Client,
    base_url: String,
    offline: bool,
}

impl MealDbClient {
    pub fn new(base_url: &str, offline: bool) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "cookbook-cli/{} (recipe manager)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            offline,
        }
    }

    async fn fetch(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<Recipe>> {
        let url = format!("{}/{endpoint}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Failed to reach TheMealDB API")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("TheMealDB API returned {status}");
        }

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse TheMealDB response")?;

        Ok(data
            .meals
            .unwrap_or_default()
            .into_iter()
            .filter_map(meal_to_recipe)
            .collect())
    }

    /// Search meals by name. A blank term yields no results without a request.
    pub async fn search(&self, term: &str) -> Vec<Recipe> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        if self.offline {
            return catalog::search_mock(term);
        }

        match self.fetch("search.php", &[("s", term)]).await {
            Ok(recipes) => {
                debug!(term, count = recipes.len(), "catalog search");
                recipes
            }
            Err(e) => {
                warn!(term, error = %format!("{e:#}"), "catalog search failed, using sample meals");
                catalog::search_mock(term)
            }
        }
    }

    pub async fn random(&self) -> Option<Recipe> {
        if !self.offline {
            match self.fetch("random.php", &[]).await {
                Ok(recipes) if !recipes.is_empty() => return recipes.into_iter().next(),
                Ok(_) => warn!("catalog returned no random meal, using sample meals"),
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "catalog random failed, using sample meals");
                }
            }
        }
        catalog::mock_meals().choose(&mut rand::rng()).cloned()
    }
}

use async_trait::async_trait;

use crate::types::{SavedArticle, User, UserProfile};
use crate::Result;

/// Accounts and their saved articles, keyed by the external identity token.
#[async_trait]
pub trait UserStore: Send + Sync {
    fn name(&self) -> &str;

    /// Case-insensitive lookup; `Error::NotFound` when nobody matches.
    async fn find_user_by_identity(&self, auth0_id: &str) -> Result<User>;

    /// Appends to the user's saved articles. Unknown users are left untouched
    /// and reported as `Error::NotFound`.
    async fn append_saved_article(&self, auth0_id: &str, article: SavedArticle) -> Result<()>;

    /// Creates the user or refreshes their profile, keeping saved articles.
    async fn upsert_user(&self, profile: UserProfile) -> Result<User>;

    async fn list_saved_articles(&self, auth0_id: &str) -> Result<Vec<SavedArticle>> {
        Ok(self.find_user_by_identity(auth0_id).await?.saved_articles)
    }
}

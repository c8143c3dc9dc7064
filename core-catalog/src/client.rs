//! Catalog client session
//!
//! A [`Client`] owns the HTTP connection pool and the token cache of one
//! session. Entities handed out by it share that state through a cheap
//! [`State`] handle; dropping the client and every entity releases it.

use core_auth::{
    AccessTokenProvider, AuthorizationPrompt, OAuthTokens, StdinPrompt, TokenManager,
};
use core_runtime::CatalogConfig;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use provider_spotify::SpotifyHttp;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::chunked::{chunked_owned, BULK_FETCH_CHUNK};
use crate::entities::{Album, Artist, ClientUser, Playlist, Track, User};
use crate::error::{CatalogError, Result};
use crate::objectify::Entity;
use crate::sequence::ListIterator;
use crate::state::State;

/// Entry point to the catalog.
///
/// # Examples
///
/// ```ignore
/// use core_catalog::Client;
/// use core_runtime::CatalogConfig;
/// use futures::TryStreamExt;
///
/// let config = CatalogConfig::builder().from_env().build()?;
/// let client = Client::new(&config);
///
/// let me = client.me().await?;
/// let mut playlists = me.playlists(None);
/// while let Some(playlist) = playlists.try_next().await? {
///     println!("{} ({:?} tracks)", playlist.name, playlist.total_tracks());
/// }
/// client.close();
/// ```
pub struct Client {
    state: State,
    tokens: Option<Arc<TokenManager>>,
}

impl Client {
    /// Client authorizing through the terminal when no usable token is
    /// configured.
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_prompt(config, Arc::new(StdinPrompt))
    }

    pub fn with_prompt(config: &CatalogConfig, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        let manager = Arc::new(TokenManager::from_config(config, prompt));
        let http = SpotifyHttp::from_config(config, manager.clone());
        Self {
            state: State::new(http),
            tokens: Some(manager),
        }
    }

    /// Client using tokens obtained elsewhere.
    pub fn with_token_provider(
        config: &CatalogConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self::from_http(SpotifyHttp::from_config(config, tokens))
    }

    pub fn from_http(http: SpotifyHttp) -> Self {
        Self {
            state: State::new(http),
            tokens: None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Current token set, when the client manages its own tokens.
    pub async fn token(&self) -> Option<OAuthTokens> {
        match &self.tokens {
            Some(manager) => manager.tokens().await,
            None => None,
        }
    }

    /// The authenticated user.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<ClientUser> {
        let record = self.state.http().fetch_me().await?;
        ClientUser::from_record(&self.state, record)
    }

    #[instrument(skip(self))]
    pub async fn fetch_album(&self, id: &str) -> Result<Album> {
        require_id(id)?;
        let record = self.state.http().get_album(id, None).await?;
        self.state.objectify_as(record)
    }

    #[instrument(skip(self))]
    pub async fn fetch_artist(&self, id: &str) -> Result<Artist> {
        require_id(id)?;
        let record = self.state.http().get_artist(id).await?;
        self.state.objectify_as(record)
    }

    #[instrument(skip(self))]
    pub async fn fetch_track(&self, id: &str) -> Result<Track> {
        require_id(id)?;
        let record = self.state.http().get_track(id, None).await?;
        self.state.objectify_as(record)
    }

    #[instrument(skip(self))]
    pub async fn fetch_playlist(&self, id: &str) -> Result<Playlist> {
        require_id(id)?;
        let record = self.state.http().get_playlist(id, None).await?;
        self.state.objectify_as(record)
    }

    #[instrument(skip(self))]
    pub async fn fetch_user(&self, id: &str) -> Result<User> {
        require_id(id)?;
        let record = self.state.http().get_user(id).await?;
        self.state.objectify_as(record)
    }

    /// Albums by id, [`BULK_FETCH_CHUNK`] per request. Unknown ids are
    /// skipped.
    pub fn fetch_albums<S: AsRef<str>>(&self, ids: &[S]) -> ListIterator<Album> {
        self.bulk(ids, |state: State, batch: Vec<String>| async move {
            state.http().get_albums(&batch, None).await.map_err(CatalogError::from)
        })
    }

    pub fn fetch_artists<S: AsRef<str>>(&self, ids: &[S]) -> ListIterator<Artist> {
        self.bulk(ids, |state: State, batch: Vec<String>| async move {
            state.http().get_artists(&batch).await.map_err(CatalogError::from)
        })
    }

    pub fn fetch_tracks<S: AsRef<str>>(&self, ids: &[S]) -> ListIterator<Track> {
        self.bulk(ids, |state: State, batch: Vec<String>| async move {
            state.http().get_tracks(&batch, None).await.map_err(CatalogError::from)
        })
    }

    /// New album releases, optionally for one market.
    pub fn new_releases(&self, country: Option<&str>, limit: Option<u32>) -> ListIterator<Album> {
        let country = country.map(str::to_string);
        self.state.paginate(
            move |state: State, page| {
                let country = country.clone();
                async move {
                    state
                        .http()
                        .get_browse_new_releases(country.as_deref(), page)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            None,
            limit,
            None,
        )
    }

    pub fn featured_playlists(
        &self,
        country: Option<&str>,
        limit: Option<u32>,
    ) -> ListIterator<Playlist> {
        let country = country.map(str::to_string);
        self.state.paginate(
            move |state: State, page| {
                let country = country.clone();
                async move {
                    state
                        .http()
                        .get_browse_featured_playlists(country.as_deref(), page)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            None,
            limit,
            None,
        )
    }

    pub fn category_playlists(
        &self,
        category: &str,
        country: Option<&str>,
        limit: Option<u32>,
    ) -> ListIterator<Playlist> {
        let category = category.to_string();
        let country = country.map(str::to_string);
        self.state.paginate(
            move |state: State, page| {
                let category = category.clone();
                let country = country.clone();
                async move {
                    state
                        .http()
                        .get_browse_category_playlists(&category, country.as_deref(), page)
                        .await
                        .map_err(CatalogError::from)
                }
            },
            None,
            limit,
            None,
        )
    }

    /// End the session. Entities still alive keep the transport until they
    /// are dropped.
    pub fn close(self) {
        info!("Catalog client closed");
    }

    fn bulk<T, S, F, Fut>(&self, ids: &[S], mut fetch: F) -> ListIterator<T>
    where
        T: TryFrom<Entity, Error = CatalogError> + Send + 'static,
        S: AsRef<str>,
        F: FnMut(State, Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<Value>>> + Send + 'static,
    {
        let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
        let fetch_state = self.state.clone();
        let state = self.state.clone();

        let records = stream::iter(chunked_owned(&ids, BULK_FETCH_CHUNK))
            .then(move |batch| fetch(fetch_state.clone(), batch))
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<Value, CatalogError>)))
            .try_flatten();

        ListIterator::new(records.and_then(move |record| future::ready(state.objectify_as(record))))
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(CatalogError::InvalidArgument {
            field: "id".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("manages_tokens", &self.tokens.is_some())
            .finish()
    }
}

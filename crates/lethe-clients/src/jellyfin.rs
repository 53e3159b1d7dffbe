//! Jellyfin library index
//!
//! Jellyfin hosts everything the janitor persists: the staging collection is
//! a playlist looked up by name, and expiration markers are item tags.

use crate::http::HttpClient;
use crate::ClientError;
use chrono::{DateTime, Utc};
use lethe_domain::traits::LibraryIndex;
use lethe_domain::{ItemId, MediaItem, MediaKind};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const ITEM_FIELDS: &str = "ProviderIds,DateCreated,Tags";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<ItemDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "Type", default)]
    item_type: String,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
    date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
    playlist_item_id: Option<String>,
    user_data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserData {
    #[serde(default)]
    played: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserDto {
    id: String,
    policy: Option<UserPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserPolicy {
    #[serde(default)]
    is_administrator: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatedPlaylist {
    id: String,
}

impl ItemDto {
    /// Convert to a domain item; `None` for kinds Lethe does not manage
    fn into_media_item(self) -> Option<MediaItem> {
        let Some(kind) = MediaKind::parse(&self.item_type) else {
            tracing::debug!("Skipping {} '{}': unmanaged item type", self.item_type, self.name);
            return None;
        };

        let external_id = self
            .provider_ids
            .iter()
            .find(|(provider, _)| provider.eq_ignore_ascii_case(kind.provider()))
            .map(|(_, id)| id.clone())
            .unwrap_or_default();

        Some(MediaItem::new(self.id, self.name, kind, external_id))
    }
}

/// Library index client for Jellyfin
pub struct JellyfinClient {
    http: HttpClient,
    user_id: Option<String>,
}

impl JellyfinClient {
    /// Create a client
    ///
    /// # Errors
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::new(base_url, "X-Emby-Token", api_key, timeout)?,
            user_id: None,
        })
    }

    /// Own the staging playlist (and read items) as this user
    ///
    /// Without it the first administrator account is used.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    fn users(&self) -> Result<Vec<UserDto>, ClientError> {
        self.http.get("/Users", &[])
    }

    fn owner_id(&self) -> Result<String, ClientError> {
        if let Some(user_id) = &self.user_id {
            return Ok(user_id.clone());
        }

        self.users()?
            .into_iter()
            .find(|user| user.policy.as_ref().is_some_and(|p| p.is_administrator))
            .map(|user| user.id)
            .ok_or_else(|| ClientError::NotFound("administrator user".to_string()))
    }

    fn library_id(&self, name: &str) -> Result<String, ClientError> {
        let response: ItemsResponse = self.http.get("/Library/MediaFolders", &[])?;
        response
            .items
            .into_iter()
            .find(|folder| folder.name == name)
            .map(|folder| folder.id)
            .ok_or_else(|| ClientError::NotFound(format!("library '{}'", name)))
    }

    fn item(&self, item: &ItemId) -> Result<ItemDto, ClientError> {
        let response: ItemsResponse = self.http.get(
            "/Items",
            &[
                ("Ids", item.to_string()),
                ("Fields", ITEM_FIELDS.to_string()),
            ],
        )?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("item {}", item)))
    }

    fn playlist_id(&self, name: &str) -> Result<Option<String>, ClientError> {
        let response: ItemsResponse = self.http.get(
            "/Items",
            &[
                ("IncludeItemTypes", "Playlist".to_string()),
                ("Recursive", "true".to_string()),
            ],
        )?;
        Ok(response
            .items
            .into_iter()
            .find(|playlist| playlist.name == name)
            .map(|playlist| playlist.id))
    }

    fn playlist_entries(&self, playlist_id: &str) -> Result<Vec<ItemDto>, ClientError> {
        let mut query = vec![("Fields", ITEM_FIELDS.to_string())];
        if let Some(user_id) = &self.user_id {
            query.push(("UserId", user_id.clone()));
        }

        let response: ItemsResponse = self
            .http
            .get(&format!("/Playlists/{}/Items", playlist_id), &query)?;
        Ok(response.items)
    }

    fn is_played_by(&self, item: &ItemId, user_id: &str) -> Result<bool, ClientError> {
        let dto: ItemDto = self
            .http
            .get(&format!("/Users/{}/Items/{}", user_id, item), &[])?;
        Ok(dto.user_data.is_some_and(|data| data.played))
    }

    /// Rewrite the item's tag list, leaving every other field untouched
    fn update_tags<F>(&self, item: &ItemId, edit: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut Vec<String>),
    {
        let owner = self.owner_id()?;
        let mut document: Value = self
            .http
            .get(&format!("/Users/{}/Items/{}", owner, item), &[])?;

        let mut tags: Vec<String> = match document.get("Tags") {
            Some(tags) if !tags.is_null() => serde_json::from_value(tags.clone())?,
            _ => Vec::new(),
        };
        edit(&mut tags);

        let Some(fields) = document.as_object_mut() else {
            return Err(ClientError::InvalidResponse(format!(
                "item {} is not a JSON object",
                item
            )));
        };
        fields.insert("Tags".to_string(), json!(tags));

        self.http
            .post_empty(&format!("/Items/{}", item), &[], Some(&document))
    }
}

impl LibraryIndex for JellyfinClient {
    type Error = ClientError;

    fn list_items(&self, library: &str) -> Result<Vec<MediaItem>, Self::Error> {
        let parent_id = self.library_id(library)?;
        let response: ItemsResponse = self.http.get(
            "/Items",
            &[
                ("ParentId", parent_id),
                ("Recursive", "true".to_string()),
                ("IncludeItemTypes", "Movie,Series".to_string()),
                ("Fields", ITEM_FIELDS.to_string()),
            ],
        )?;

        Ok(response
            .items
            .into_iter()
            .filter_map(ItemDto::into_media_item)
            .collect())
    }

    fn is_watched_by_all(&self, item: &ItemId) -> Result<bool, Self::Error> {
        let users = self.users()?;
        // Nobody to have watched it; never counts as watched by all
        if users.is_empty() {
            return Ok(false);
        }

        for user in &users {
            if !self.is_played_by(item, &user.id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn added_date(&self, item: &ItemId) -> Result<DateTime<Utc>, Self::Error> {
        self.item(item)?
            .date_created
            .ok_or_else(|| ClientError::InvalidResponse(format!("item {} has no DateCreated", item)))
    }

    fn is_in_staging(&self, item: &ItemId, collection: &str) -> Result<bool, Self::Error> {
        let Some(playlist_id) = self.playlist_id(collection)? else {
            return Ok(false);
        };
        Ok(self
            .playlist_entries(&playlist_id)?
            .iter()
            .any(|entry| entry.id == item.as_str()))
    }

    fn add_to_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error> {
        let owner = self.owner_id()?;

        match self.playlist_id(collection)? {
            Some(playlist_id) => self.http.post_empty::<Value>(
                &format!("/Playlists/{}/Items", playlist_id),
                &[("Ids", item.to_string()), ("UserId", owner)],
                None,
            ),
            None => {
                tracing::info!("Creating staging playlist '{}'", collection);
                let body = json!({
                    "Name": collection,
                    "Ids": [item.as_str()],
                    "UserId": owner,
                    "MediaType": "Video",
                });
                let created: CreatedPlaylist = self.http.post("/Playlists", &[], &body)?;
                tracing::debug!("Staging playlist '{}' has id {}", collection, created.id);
                Ok(())
            }
        }
    }

    fn remove_from_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error> {
        let playlist_id = self
            .playlist_id(collection)?
            .ok_or_else(|| ClientError::NotFound(format!("playlist '{}'", collection)))?;

        let entry_ids: Vec<String> = self
            .playlist_entries(&playlist_id)?
            .into_iter()
            .filter(|entry| entry.id == item.as_str())
            .filter_map(|entry| entry.playlist_item_id)
            .collect();

        // Already gone
        if entry_ids.is_empty() {
            return Ok(());
        }

        self.http.delete(
            &format!("/Playlists/{}/Items", playlist_id),
            &[("EntryIds", entry_ids.join(","))],
        )
    }

    fn markers(&self, item: &ItemId, prefix: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .item(item)?
            .tags
            .into_iter()
            .filter(|tag| tag.starts_with(prefix))
            .collect())
    }

    fn add_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error> {
        self.update_tags(item, |tags| {
            if !tags.iter().any(|tag| tag == marker) {
                tags.push(marker.to_string());
            }
        })
    }

    fn remove_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error> {
        self.update_tags(item, |tags| tags.retain(|tag| tag != marker))
    }

    fn staged_items(&self, collection: &str) -> Result<Vec<MediaItem>, Self::Error> {
        let Some(playlist_id) = self.playlist_id(collection)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .playlist_entries(&playlist_id)?
            .into_iter()
            .filter_map(ItemDto::into_media_item)
            .collect())
    }
}

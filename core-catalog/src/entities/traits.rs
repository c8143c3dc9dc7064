//! Capabilities shared across otherwise unrelated entities.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::objectify::EntityKind;

/// Identity of a catalog object. Fixed once the object is constructed.
pub trait CatalogObject {
    fn id(&self) -> &str;

    fn uri(&self) -> &str;

    fn kind(&self) -> EntityKind;
}

/// Re-request the full record by id and replace every field with it.
///
/// The fresh record is decoded completely before anything is replaced, so a
/// failed fetch leaves the object untouched. Identity is kept.
#[async_trait]
pub trait Fetch {
    async fn fetch(&mut self) -> Result<()>;
}

/// Objects with a public web page.
pub trait ExternalUrl {
    fn external_urls(&self) -> &HashMap<String, String>;

    /// Link to the object's page on the web player.
    fn url(&self) -> Option<&str> {
        self.external_urls().get("spotify").map(String::as_str)
    }
}

/// Objects users can follow.
pub trait Followable {
    /// Follower count, when the record carried one.
    fn followers(&self) -> Option<u64>;
}

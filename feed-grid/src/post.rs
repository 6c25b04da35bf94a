//! Post items consumed by the feed grid.
//!
//! The grid never owns or mutates posts. Hosts either hand over [`Post`]
//! values directly or implement [`FeedItem`] for their own model type.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

/// Stable identity of a post.
///
/// Ids must be unique within one post list. Insertion order of the list is
/// the feed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl ItemId {
    /// Derives an id from any hashable host key.
    ///
    /// ```
    /// use feed_grid::ItemId;
    ///
    /// let a = ItemId::from_key(&"post-42");
    /// let b = ItemId::from_key(&"post-42");
    /// assert_eq!(a, b);
    /// assert_ne!(a, ItemId::from_key(&"post-43"));
    /// ```
    pub fn from_key<K: Hash + ?Sized>(key: &K) -> Self {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        ItemId(hasher.finish())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        ItemId(value)
    }
}

/// The kind of heavyweight surface a post needs.
///
/// Render keys are never shared between kinds: an image view cannot be
/// recycled into a video decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

impl MediaKind {
    /// Every media kind, in pool order.
    pub const ALL: [MediaKind; 2] = [MediaKind::Image, MediaKind::Video];

    /// Number of media kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used to address per-kind tables.
    pub const fn index(self) -> usize {
        match self {
            MediaKind::Image => 0,
            MediaKind::Video => 1,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Read access to the fields the grid needs from a post.
pub trait FeedItem {
    /// Stable identity of the item.
    fn id(&self) -> ItemId;
    /// Surface kind required to render the item.
    fn media_kind(&self) -> MediaKind;
    /// Width divided by height of the rendered media. Must be finite and
    /// positive.
    fn aspect_ratio(&self) -> f32;
}

/// A plain post record.
///
/// ```
/// use feed_grid::{FeedItem, ItemId, MediaKind, Post};
///
/// let post = Post::video(7, 16.0 / 9.0);
/// assert_eq!(post.id(), ItemId(7));
/// assert_eq!(post.media_kind(), MediaKind::Video);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Post {
    /// Stable identity.
    pub id: ItemId,
    /// Surface kind.
    pub kind: MediaKind,
    /// Width / height of the media.
    pub aspect_ratio: f32,
}

impl Post {
    /// Creates a post.
    pub fn new(id: impl Into<ItemId>, kind: MediaKind, aspect_ratio: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            aspect_ratio,
        }
    }

    /// Creates an image post with a numeric id.
    pub fn image(id: u64, aspect_ratio: f32) -> Self {
        Self::new(ItemId(id), MediaKind::Image, aspect_ratio)
    }

    /// Creates a video post with a numeric id.
    pub fn video(id: u64, aspect_ratio: f32) -> Self {
        Self::new(ItemId(id), MediaKind::Video, aspect_ratio)
    }
}

impl FeedItem for Post {
    fn id(&self) -> ItemId {
        self.id
    }

    fn media_kind(&self) -> MediaKind {
        self.kind
    }

    fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

impl<T: FeedItem + ?Sized> FeedItem for &T {
    fn id(&self) -> ItemId {
        (**self).id()
    }

    fn media_kind(&self) -> MediaKind {
        (**self).media_kind()
    }

    fn aspect_ratio(&self) -> f32 {
        (**self).aspect_ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_indices_are_dense() {
        for (position, kind) in MediaKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
        assert_eq!(MediaKind::COUNT, 2);
    }

    #[test]
    fn test_item_id_from_key_is_stable_for_equal_keys() {
        let owned = String::from("abc");
        assert_eq!(ItemId::from_key(owned.as_str()), ItemId::from_key("abc"));
        assert_eq!(ItemId::from_key(&(1u32, 2u32)), ItemId::from_key(&(1u32, 2u32)));
    }

    #[test]
    fn test_post_constructors() {
        let post = Post::image(3, 0.75);
        assert_eq!(post.kind, MediaKind::Image);
        assert_eq!(post.id, ItemId(3));
        assert_eq!((&post).aspect_ratio(), 0.75);
    }
}

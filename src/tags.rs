use std::collections::HashMap;

use crate::formats::{EntryId, NewTag, Tag};
use crate::store::ContentStore;

pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let hyphenated = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    hyphenated
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

pub fn split_tag_names(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty())
}

#[derive(Debug, Default)]
pub struct TagCache {
    ids: HashMap<String, EntryId>,
}

impl TagCache {
    pub fn get(&self, name: &str) -> Option<EntryId> {
        self.ids.get(&name.trim().to_lowercase()).copied()
    }

    pub fn insert(&mut self, name: &str, tag: &Tag) {
        self.ids.insert(name.trim().to_lowercase(), tag.id);
        if !tag.slug.is_empty() {
            self.ids.insert(tag.slug.clone(), tag.id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub struct TagResolver<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    cache: TagCache,
}

impl<'a, S: ContentStore + ?Sized> TagResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: TagCache::default(),
        }
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    pub async fn warm(&mut self) -> anyhow::Result<usize> {
        let tags = self.store.list_tags().await?;
        for tag in &tags {
            self.cache.insert(&tag.name, tag);
        }
        Ok(tags.len())
    }

    /// Comma-separated names to distinct ids. Tags that fail to resolve are left out.
    pub async fn resolve(&mut self, raw: Option<&str>) -> Vec<EntryId> {
        let Some(raw) = raw else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        for name in split_tag_names(raw) {
            if let Some(id) = self.resolve_one(name).await
                && !ids.contains(&id)
            {
                ids.push(id);
            }
        }
        ids
    }

    pub async fn resolve_one(&mut self, name: &str) -> Option<EntryId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(id) = self.cache.get(name) {
            return Some(id);
        }

        match self.lookup_or_create(name).await {
            Ok(tag) => {
                self.cache.insert(name, &tag);
                Some(tag.id)
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::error!(tag = name, %error, "failed to get or create tag; leaving it out");
                None
            }
        }
    }

    async fn lookup_or_create(&self, name: &str) -> anyhow::Result<Tag> {
        if let Some(tag) = self.store.find_tag_by_name(name).await? {
            return Ok(tag);
        }

        let new_tag = NewTag {
            name: name.to_owned(),
            slug: slugify(name),
            description: None,
            order: None,
        };
        tracing::info!(tag = name, slug = %new_tag.slug, "creating new tag");
        Ok(self.store.create_tag(&new_tag).await?)
    }
}

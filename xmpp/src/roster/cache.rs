// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Byte caches used to keep the roster between connections.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use tokio::fs::{create_dir_all, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_xmpp::jid::BareJid;

/// A key/value store for opaque bytes.
pub trait ByteCache: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<Vec<u8>>>>;

    /// Store `value` under `key`, replacing what was there.
    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, io::Result<()>>;
}

/// The key an account's data is cached under: the hex SHA-1 of its bare
/// JID.
pub fn cache_key(account: &BareJid) -> String {
    Sha1::digest(account.to_string().as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// A cache which lives as long as the process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }
}

impl ByteCache for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<Vec<u8>>>> {
        let value = self.entries.lock().get(key).cloned();
        Box::pin(async move { Ok(value) })
    }

    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, io::Result<()>> {
        self.entries.lock().insert(key.to_owned(), value);
        Box::pin(async { Ok(()) })
    }
}

/// A cache keeping one file per key in a directory.
pub struct DirectoryCache {
    directory: PathBuf,
}

impl DirectoryCache {
    /// Cache into `directory`, which gets created on the first write.
    pub fn new<P: Into<PathBuf>>(directory: P) -> DirectoryCache {
        DirectoryCache {
            directory: directory.into(),
        }
    }
}

impl ByteCache for DirectoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<Vec<u8>>>> {
        Box::pin(async move {
            let mut file = match File::open(self.directory.join(key)).await {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e),
            };
            let mut data = Vec::new();
            file.read_to_end(&mut data).await?;
            Ok(Some(data))
        })
    }

    fn put<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            create_dir_all(&self.directory).await?;
            let mut file = File::create(self.directory.join(key)).await?;
            file.write_all(&value).await?;
            file.flush().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_hex_sha1() {
        let key = cache_key(&BareJid::new("juliet@example.com").unwrap());
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(key, cache_key(&BareJid::new("romeo@example.net").unwrap()));
    }

    #[tokio::test]
    async fn memory() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("a").await.unwrap(), None);
        cache.put("a", b"roster".to_vec()).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(b"roster".to_vec()));
    }

    #[tokio::test]
    async fn directory() {
        let directory = std::env::temp_dir().join(format!("xmpp-cache-{}", std::process::id()));
        let cache = DirectoryCache::new(&directory);
        assert_eq!(cache.get("a").await.unwrap(), None);
        cache.put("a", b"first".to_vec()).await.unwrap();
        cache.put("a", b"second".to_vec()).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(b"second".to_vec()));
        let _ = std::fs::remove_dir_all(&directory);
    }
}

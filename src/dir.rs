// src/dir.rs
//
// Каталог бакетов: N бакетов, у каждого упорядоченный список страниц
// (страница 0 + overflow-страницы 1..k) и опциональный in-memory keydir.
//
// Инварианты:
// - страница 0 существует всегда; overflow-страницы создаются строго по
//   возрастанию индекса, не удаляются и не переупорядочиваются;
// - запись идёт только в последнюю страницу; заполненные страницы остаются
//   доступны для read/update/delete;
// - каждый бакет под своим RwLock: write/update/delete держат его эксклюзивно
//   на всё check-then-act, чтения — разделяемо.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::codec::{EncodedRow, Record};
use crate::error::{Result, StoreError};
use crate::hash::bucket_of_key;
use crate::metrics::record_overflow_page_created;
use crate::page::{Page, PageSettings};

/// In-memory keydir бакета: trimmed key -> page_index.
/// Строится при открытии из файлов, поддерживается write/delete.
#[derive(Debug, Default)]
pub struct KeyDir {
    map: HashMap<String, u32>,
}

impl KeyDir {
    #[inline]
    pub fn get(&self, key: &str) -> Option<u32> {
        self.map.get(key.trim()).copied()
    }

    #[inline]
    pub fn insert(&mut self, key: &str, page_index: u32) {
        self.map.insert(key.trim().to_string(), page_index);
    }

    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<u32> {
        self.map.remove(key.trim())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug)]
pub struct Bucket {
    id: u32,
    settings: Arc<PageSettings>,
    pages: Vec<Page>,
    keydir: Option<KeyDir>,
}

impl Bucket {
    /// Подключить страницы бакета с диска: 0 (создаётся при отсутствии, если
    /// `create`) и все существующие overflow-страницы 1, 2, … подряд.
    pub fn open(settings: Arc<PageSettings>, id: u32, create: bool, mem_keydir: bool) -> Result<Self> {
        let first = Page::new(settings.clone(), id, 0);
        if create {
            first.create_if_absent()?;
        } else if !first.exists() {
            return Err(StoreError::Config(format!(
                "page file {} is missing (store not initialized?)",
                first.path().display()
            )));
        } else {
            first.load()?;
        }

        let mut pages = vec![first];
        loop {
            let next = Page::new(settings.clone(), id, pages.len() as u32);
            if !next.exists() {
                break;
            }
            // сверка заголовка
            next.load()?;
            pages.push(next);
        }

        let mut b = Self {
            id,
            settings,
            pages,
            keydir: None,
        };
        if mem_keydir {
            b.rebuild_keydir()?;
        }
        Ok(b)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn last_page(&self) -> &Page {
        // pages никогда не пуст: страница 0 есть всегда
        &self.pages[self.pages.len() - 1]
    }

    pub fn rebuild_keydir(&mut self) -> Result<()> {
        let schema = self.settings.schema.clone();
        let mut kd = KeyDir::default();
        for p in &self.pages {
            for row in p.rows()? {
                let key = row.key(&schema).trim().to_string();
                match kd.get(&key) {
                    Some(prev) => warn!(
                        "bucket {}: key '{}' found on pages {} and {}; keeping page {}",
                        self.id,
                        key,
                        prev,
                        p.page_index(),
                        prev
                    ),
                    None => kd.insert(&key, p.page_index()),
                }
            }
        }
        debug!("bucket {}: keydir rebuilt ({} keys)", self.id, kd.len());
        self.keydir = Some(kd);
        Ok(())
    }

    /// Индекс страницы, где лежит ключ. Без keydir — обход страниц 0, 1, 2, …
    pub fn locate(&self, key: &str) -> Result<Option<u32>> {
        if let Some(kd) = self.keydir.as_ref() {
            return Ok(kd.get(key));
        }
        for p in &self.pages {
            if p.contains(key)? {
                return Ok(Some(p.page_index()));
            }
        }
        Ok(None)
    }

    pub fn read(&self, key: &str) -> Result<Option<Record>> {
        if let Some(kd) = self.keydir.as_ref() {
            return match kd.get(key) {
                Some(pi) => self.pages[pi as usize].read(key),
                None => Ok(None),
            };
        }
        for p in &self.pages {
            if let Some(r) = p.read(key)? {
                return Ok(Some(r));
            }
        }
        Ok(None)
    }

    /// Дописать строку в последнюю страницу; если она полна — создать
    /// overflow-страницу (index = len(pages)) и писать туда.
    /// Свежая страница обязана принять строку, иначе PageCapacityExceeded.
    pub fn append(&mut self, key: &str, row: &EncodedRow) -> Result<u32> {
        if self.last_page().write_row(row)? {
            let pi = self.last_page().page_index();
            if let Some(kd) = self.keydir.as_mut() {
                kd.insert(key, pi);
            }
            return Ok(pi);
        }

        let new_index = self.pages.len() as u32;
        let page = Page::open(self.settings.clone(), self.id, new_index)?;
        record_overflow_page_created();
        info!(
            "bucket {}: page {} full, created overflow page {} ({})",
            self.id,
            new_index - 1,
            new_index,
            page.path().display()
        );
        self.pages.push(page);

        if !self.last_page().write_row(row)? {
            let row_bytes = self.last_page().row_bytes(row)?.len() as u64;
            return Err(StoreError::PageCapacityExceeded {
                bucket: self.id,
                page_index: new_index,
                row_bytes,
                max_size: self.settings.max_size,
            });
        }
        if let Some(kd) = self.keydir.as_mut() {
            kd.insert(key, new_index);
        }
        Ok(new_index)
    }

    /// Заменить строку с ключом. С keydir трогается только страница с ключом,
    /// без него — обход всех страниц (страницы без ключа не перезаписываются).
    pub fn update(&mut self, key: &str, row: &EncodedRow) -> Result<bool> {
        if let Some(kd) = self.keydir.as_ref() {
            return match kd.get(key) {
                Some(pi) => self.pages[pi as usize].update_row(key, row),
                None => Ok(false),
            };
        }
        let mut hit = false;
        for p in &self.pages {
            hit |= p.update_row(key, row)?;
        }
        Ok(hit)
    }

    pub fn delete(&mut self, key: &str) -> Result<bool> {
        if let Some(kd) = self.keydir.as_mut() {
            return match kd.get(key) {
                Some(pi) => {
                    let hit = self.pages[pi as usize].delete(key)?;
                    kd.remove(key);
                    Ok(hit)
                }
                None => Ok(false),
            };
        }
        let mut hit = false;
        for p in &self.pages {
            hit |= p.delete(key)?;
        }
        Ok(hit)
    }
}

pub struct Directory {
    settings: Arc<PageSettings>,
    buckets: Vec<RwLock<Bucket>>,
}

impl Directory {
    pub fn open(settings: Arc<PageSettings>, bucket_count: u32, create: bool, mem_keydir: bool) -> Result<Self> {
        if bucket_count == 0 {
            return Err(StoreError::Config("buckets must be > 0".into()));
        }
        let mut buckets = Vec::with_capacity(bucket_count as usize);
        for id in 0..bucket_count {
            buckets.push(RwLock::new(Bucket::open(settings.clone(), id, create, mem_keydir)?));
        }
        Ok(Self { settings, buckets })
    }

    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.buckets.len() as u32
    }

    #[inline]
    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub fn bucket_of_key(&self, key: &str) -> Result<u32> {
        bucket_of_key(key, self.bucket_count())
    }

    pub fn bucket(&self, bucket: u32) -> Result<&RwLock<Bucket>> {
        self.buckets.get(bucket as usize).ok_or_else(|| {
            StoreError::Config(format!(
                "bucket {} out of range 0..{}",
                bucket,
                self.bucket_count()
            ))
        })
    }

    pub fn buckets(&self) -> impl Iterator<Item = &RwLock<Bucket>> {
        self.buckets.iter()
    }

    pub fn count_used_buckets(&self) -> Result<u32> {
        let mut used = 0u32;
        for b in &self.buckets {
            let g = b.read();
            let mut rows = 0usize;
            for p in g.pages() {
                rows += p.row_count()?;
            }
            if rows > 0 {
                used += 1;
            }
        }
        Ok(used)
    }
}

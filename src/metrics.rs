//! Lightweight global metrics for BucketDB.
//!
//! Потокобезопасные атомарные счётчики:
//! - операции (write/read/update/delete)
//! - дубликаты, отклонённые при записи
//! - страницы (overflow, перезаписи, in-place патчи)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Operations -----
static WRITES_TOTAL: AtomicU64 = AtomicU64::new(0);
static READS_TOTAL: AtomicU64 = AtomicU64::new(0);
static UPDATES_TOTAL: AtomicU64 = AtomicU64::new(0);
static DELETES_TOTAL: AtomicU64 = AtomicU64::new(0);
static DUPLICATE_REJECTS: AtomicU64 = AtomicU64::new(0);

// ----- Pages -----
static OVERFLOW_PAGES_CREATED: AtomicU64 = AtomicU64::new(0);
static PAGE_REWRITES: AtomicU64 = AtomicU64::new(0);
static PAGE_INPLACE_PATCHES: AtomicU64 = AtomicU64::new(0);
static ROW_BYTES_APPENDED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub writes_total: u64,
    pub reads_total: u64,
    pub updates_total: u64,
    pub deletes_total: u64,
    pub duplicate_rejects: u64,

    pub overflow_pages_created: u64,
    pub page_rewrites: u64,
    pub page_inplace_patches: u64,
    pub row_bytes_appended: u64,
}

impl MetricsSnapshot {
    /// Доля update, обработанных патчем без перезаписи страницы.
    pub fn inplace_ratio(&self) -> f64 {
        let total = self.page_inplace_patches + self.page_rewrites;
        if total == 0 {
            0.0
        } else {
            self.page_inplace_patches as f64 / total as f64
        }
    }
}

#[inline]
pub fn record_write() {
    WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_read() {
    READS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_update() {
    UPDATES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_delete() {
    DELETES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_duplicate_reject() {
    DUPLICATE_REJECTS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_overflow_page_created() {
    OVERFLOW_PAGES_CREATED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_page_rewrite() {
    PAGE_REWRITES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_inplace_patch() {
    PAGE_INPLACE_PATCHES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_row_appended(bytes: u64) {
    ROW_BYTES_APPENDED.fetch_add(bytes, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        writes_total: WRITES_TOTAL.load(Ordering::Relaxed),
        reads_total: READS_TOTAL.load(Ordering::Relaxed),
        updates_total: UPDATES_TOTAL.load(Ordering::Relaxed),
        deletes_total: DELETES_TOTAL.load(Ordering::Relaxed),
        duplicate_rejects: DUPLICATE_REJECTS.load(Ordering::Relaxed),
        overflow_pages_created: OVERFLOW_PAGES_CREATED.load(Ordering::Relaxed),
        page_rewrites: PAGE_REWRITES.load(Ordering::Relaxed),
        page_inplace_patches: PAGE_INPLACE_PATCHES.load(Ordering::Relaxed),
        row_bytes_appended: ROW_BYTES_APPENDED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    for c in [
        &WRITES_TOTAL,
        &READS_TOTAL,
        &UPDATES_TOTAL,
        &DELETES_TOTAL,
        &DUPLICATE_REJECTS,
        &OVERFLOW_PAGES_CREATED,
        &PAGE_REWRITES,
        &PAGE_INPLACE_PATCHES,
        &ROW_BYTES_APPENDED,
    ] {
        c.store(0, Ordering::Relaxed);
    }
}
